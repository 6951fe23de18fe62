use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("splitview")
        .version("1.0.0")
        .author("SplitView Contributors")
        .about("Extract picked elements of web pages")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-s --select <SELECTOR> "CSS selector of the elements to extract")
                .value_name("SELECTOR")
                .default_value("body"),
        )
        .arg(clap::arg!(--siblings "Extract the first match together with its similar siblings"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (rich, markdown, text, json, print)")
                .value_name("FORMAT")
                .default_value("markdown")
                .value_parser(["rich", "markdown", "text", "json", "print"]),
        )
        .arg(clap::arg!(--base_url <URL> "Base URL for resolving links of file or stdin input").value_name("URL"))
        .arg(
            clap::arg!(--rules_dir <DIR> "Custom site rule directory")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--no_rules "Do not load site rules"))
        .arg(clap::arg!(--no_styles "Do not inline resolved styles"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(
            clap::arg!(--expand_timeout <MS> "How long to wait for expanded content, in milliseconds")
                .default_value("2000"),
        )
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "splitview", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "splitview", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "splitview", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "splitview", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
