use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let o = Command::new("git").args(args).output().ok()?;
    if !o.status.success() {
        return None;
    }
    String::from_utf8(o.stdout).ok().map(|s| s.trim().to_string())
}

fn main() {
    let version = git(&["describe", "--always", "--dirty"])
        .unwrap_or("(unknown)".to_string());
    println!("cargo:rustc-env=VERSION={version}");

    if let Some(path) =
        git(&["rev-parse", "--path-format=relative", "--git-dir"])
    {
        println!("cargo:rerun-if-changed={path}/HEAD");
        // default rerun paths get lost once any have been added.
        println!("cargo:rerun-if-changed=.");
    }
}
