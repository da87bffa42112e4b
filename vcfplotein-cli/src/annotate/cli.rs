use clap::{Arg, Command, value_parser};

pub const ANNOTATE_CMD: &str = "annotate";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .about("Annotate the variants of a VCF file on one transcript and report database presence")
        .arg(
            Arg::new("vcf")
                .long("vcf")
                .short('v')
                .required(true)
                .help("Path to the input VCF file (plain or gzip-compressed)"),
        )
        .arg(
            Arg::new("transcript")
                .long("transcript")
                .short('t')
                .required(true)
                .help("Transcript identifier to annotate against, e.g. ENST00000288602"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .value_parser(value_parser!(u32))
                .help("Assembly version of the annotation service (37 or 38)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the variant presence API"),
        )
        .arg(
            Arg::new("ensembl-url")
                .long("ensembl-url")
                .help("Base URL of the variant-effect service"),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .value_parser(value_parser!(u32))
                .help("Attempts per remote request, including the first (1 disables retry)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Where to write the JSON bundle (default: stdout)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value(DEFAULT_LOG_LEVEL)
                .help("Log filter, e.g. info, debug or vcfplotein_annotate=debug"),
        )
}
