use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub listen: String,
    pub db_path: PathBuf,
}
