use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Steam app id, used to find the Proton prefix on Linux.
const STEAM_APP_ID: &str = "881100";
const SAVE_SESSIONS: [&str; 6] = [
    "AppData",
    "LocalLow",
    "Nolla_Games_Noita",
    "save00",
    "stats",
    "sessions",
];

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "noita-recap").map(|pd| pd.config_dir().join("config.json"))
    }

    /// Where the game writes per-session stats on this platform.
    pub fn sessions_dir() -> Option<PathBuf> {
        let home = BaseDirs::new()?.home_dir().to_path_buf();
        let profile = if cfg!(windows) {
            home
        } else {
            home.join(".steam")
                .join("steam")
                .join("steamapps")
                .join("compatdata")
                .join(STEAM_APP_ID)
                .join("pfx")
                .join("drive_c")
                .join("users")
                .join("steamuser")
        };
        Some(SAVE_SESSIONS.iter().fold(profile, |p, part| p.join(part)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_dir_ends_in_save_folder() {
        if let Some(dir) = AppDirs::sessions_dir() {
            assert!(dir.ends_with("Nolla_Games_Noita/save00/stats/sessions"));
        }
    }
}
