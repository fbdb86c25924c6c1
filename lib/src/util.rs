use chrono::{DateTime, Utc};
use log::{info, warn};
use std::{
    fs::{self, OpenOptions},
    io::Write,
};

pub fn append_info_to_file(file_path: &str, info: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .append(true)
        .create(true)
        .open(file_path)
    {
        if let Err(err) = file.write_all(info.as_bytes()) {
            eprintln!("Failed to write to file: {}", err);
        }
    } else {
        eprintln!("Failed to open file: {}", file_path);
    }
}

pub fn create_output_file(folder_path: &str, file_name: &str, extension: &str) -> String {
    if fs::metadata(folder_path).is_err() {
        let _ = fs::create_dir_all(folder_path);
        info!("Created folder: {}", folder_path);
    }
    let file_path = format!("{}/{}.{}", folder_path, file_name, extension);
    if let Err(err) = fs::File::create(&file_path) {
        warn!("Failed to create file: {}", err);
    }
    file_path
}

/// Timestamped output file for one solver run, e.g.
/// `2026-08-02-12-00-00-aco-convergence.csv`.
pub fn create_run_output_file(
    dir_path: &str,
    alg_name: &str,
    kind: &str,
    extension: &str,
) -> String {
    let now: DateTime<Utc> = Utc::now();
    let date = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let file_name = format!("{}-{}-{}", date, alg_name, kind);
    create_output_file(dir_path, &file_name, extension)
}
