// Get git info
// make available to src as constants
// https://stackoverflow.com/questions/43753491/include-git-commit-hash-as-string-into-rust-program
use std::process::Command;

fn git_output(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_owned())
        .unwrap_or_else(|| "unknown".to_owned())
}

fn main() {
    let git_describe = git_output(&["describe", "--tags", "--always"]);
    println!("cargo:rustc-env=GIT_DESCRIBE={git_describe}");

    let git_hash = git_output(&["rev-parse", "HEAD"]);
    println!("cargo:rustc-env=GIT_HASH={git_hash}");
}
