use serde::Serialize;

/// Pseudo category id that evaluates a query across every category.
pub const ALL_CATEGORIES: &str = "all";

/// One category of the built-in command taxonomy. Immutable after startup;
/// filtering produces views, never mutates the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CommandCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub templates: &'static [&'static str],
}

/// A category as it appears in a filtered view: only the templates that
/// matched the query. Categories with no match are dropped from the result
/// entirely rather than shown empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatches {
    pub id: &'static str,
    pub label: &'static str,
    pub templates: Vec<&'static str>,
}

/// Static taxonomy of everything the service understands, grouped the way the
/// commands screen presents it.
#[derive(Debug, Clone, Copy)]
pub struct CommandCatalog {
    categories: &'static [CommandCategory],
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CommandCatalog {
    pub fn builtin() -> Self {
        Self {
            categories: BUILTIN_CATEGORIES,
        }
    }

    pub fn categories(&self) -> &'static [CommandCategory] {
        self.categories
    }

    /// Case- and whitespace-insensitive substring filter. Both sides are
    /// folded to lowercase and stripped of whitespace before matching, so the
    /// spoken-style query "shutdown" still finds "Shut down the computer".
    /// An empty query matches every template; an unknown `category_id` yields
    /// an empty result. Pure: identical inputs always produce identical
    /// output.
    pub fn filter(&self, query: &str, category_id: &str) -> Vec<CategoryMatches> {
        let needle = normalize(query);
        self.categories
            .iter()
            .filter(|category| category_id == ALL_CATEGORIES || category.id == category_id)
            .filter_map(|category| {
                let templates: Vec<&'static str> = category
                    .templates
                    .iter()
                    .copied()
                    .filter(|template| normalize(template).contains(&needle))
                    .collect();
                if templates.is_empty() {
                    None
                } else {
                    Some(CategoryMatches {
                        id: category.id,
                        label: category.label,
                        templates,
                    })
                }
            })
            .collect()
    }
}

/// Snapshot of the command browser's search: the query, the scope, and the
/// categories that matched. Published whenever the search changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub query: String,
    pub category_id: String,
    pub categories: Vec<CategoryMatches>,
}

impl CatalogView {
    pub fn from_query(catalog: &CommandCatalog, query: &str, category_id: &str) -> Self {
        Self {
            query: query.to_string(),
            category_id: category_id.to_string(),
            categories: catalog.filter(query, category_id),
        }
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

static BUILTIN_CATEGORIES: &[CommandCategory] = &[
    CommandCategory {
        id: "system",
        label: "System Control",
        templates: &[
            "Shut down the computer",
            "Restart the computer",
            "Put the computer to sleep",
            "Hibernate the computer",
            "Lock the computer",
            "Sign out of the computer",
            "Switch user",
            "Open Task Manager",
            "Open Control Panel",
            "Open Settings",
            "Check battery level",
            "Show system information",
            "Open Device Manager",
            "Open System Properties",
        ],
    },
    CommandCategory {
        id: "files",
        label: "File & Folder Management",
        templates: &[
            "Open File Explorer",
            "Create a new folder",
            "Delete this file",
            "Rename this file to [new name]",
            "Copy this file",
            "Paste the file here",
            "Cut this file",
            "Move this file to [folder name]",
            "Search for [file name]",
            "Show hidden files",
            "Hide this file",
            "Open the recycle bin",
            "Empty the recycle bin",
            "Zip this folder",
            "Unzip this file",
            "Open [file name]",
            "Save this file",
        ],
    },
    CommandCategory {
        id: "apps",
        label: "Application Management",
        templates: &[
            "Open [application name]",
            "Close [application name]",
            "Minimize this window",
            "Maximize this window",
            "Switch to [application name]",
            "Open a new window",
            "Open a new tab",
            "Close this tab",
            "Open Task Manager",
            "End task [application name]",
            "Install [application name]",
            "Uninstall [application name]",
            "Update all applications",
            "Run as administrator",
        ],
    },
    CommandCategory {
        id: "web",
        label: "Web Browsing",
        templates: &[
            "Open [website name]",
            "Search for [query]",
            "Go back",
            "Go forward",
            "Refresh the page",
            "Close the browser",
            "Open a new tab",
            "Close this tab",
            "Switch to tab number [number]",
            "Bookmark this page",
            "Clear browsing history",
            "Download this file",
            "Zoom in",
            "Zoom out",
            "Scroll up",
            "Scroll down",
            "Mute this tab",
            "Unmute this tab",
        ],
    },
    CommandCategory {
        id: "media",
        label: "Media Control",
        templates: &[
            "Play",
            "Pause",
            "Stop",
            "Next track",
            "Previous track",
            "Increase volume",
            "Decrease volume",
            "Mute",
            "Unmute",
            "Open [media player name]",
            "Full screen",
            "Exit full screen",
            "Skip forward [X seconds/minutes]",
            "Skip backward [X seconds/minutes]",
            "Shuffle playlist",
            "Repeat this song",
        ],
    },
    CommandCategory {
        id: "accessibility",
        label: "Accessibility",
        templates: &[
            "Turn on narrator",
            "Turn off narrator",
            "Increase text size",
            "Decrease text size",
            "Turn on high contrast mode",
            "Turn off high contrast mode",
            "Open magnifier",
            "Zoom in",
            "Zoom out",
            "Turn on color filters",
            "Turn off color filters",
            "Open on-screen keyboard",
            "Close on-screen keyboard",
        ],
    },
    CommandCategory {
        id: "network",
        label: "Network & Connectivity",
        templates: &[
            "Turn on Wi-Fi",
            "Turn off Wi-Fi",
            "Connect to [network name]",
            "Disconnect from Wi-Fi",
            "Turn on Bluetooth",
            "Turn off Bluetooth",
            "Pair Bluetooth device",
            "Unpair Bluetooth device",
            "Check internet speed",
            "Open network settings",
            "View available networks",
            "Enable airplane mode",
            "Disable airplane mode",
        ],
    },
    CommandCategory {
        id: "misc",
        label: "Miscellaneous",
        templates: &[
            "Take a screenshot",
            "Record the screen",
            "Stop recording",
            "Open calculator",
            "Open notepad",
            "Open command prompt",
            "Open PowerShell",
            "Open registry editor",
            "Open disk management",
            "Check disk space",
            "Check CPU usage",
            "Check RAM usage",
            "Check GPU usage",
            "Open event viewer",
            "Open system restore",
        ],
    },
];
