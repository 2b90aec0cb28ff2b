// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
 _ __   ___ _   _ _ __ ___  _ __
| '_ \ / _ \ | | | '__/ _ \| '_ \
| | | |  __/ |_| | | | (_) | | | |
|_| |_|\___|\__,_|_|  \___/|_| |_|
                 s a n d b o x

    Run hosted neurons by hand
"#;
    println!("{}", banner);
}
