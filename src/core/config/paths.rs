use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    /// Source documents fed to the loader; upload and durable-append target.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub chat_log_dir: PathBuf,
    pub index_db_path: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let data_dir = env::var("NHTC_SOURCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| user_data_dir.join("data"));
        Self::from_dirs(project_root, user_data_dir, data_dir)
    }

    /// Lays the standard tree out under `user_data_dir`. Used directly by tests.
    pub fn from_dirs(project_root: PathBuf, user_data_dir: PathBuf, data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");
        let chat_log_dir = user_data_dir.join("chat_logs");
        let index_db_path = user_data_dir.join("index.db");
        let secrets_path = user_data_dir.join("secrets.yaml");

        for dir in [&user_data_dir, &data_dir, &log_dir, &chat_log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            data_dir,
            log_dir,
            chat_log_dir,
            index_db_path,
            secrets_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("NHTC_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("NHTC_DATA_DIR") {
        return PathBuf::from(dir);
    }
    project_root.to_path_buf()
}
