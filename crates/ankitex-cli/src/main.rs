use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ankitex_core::config::{CompressionMask, TextureFilter, TextureTopology};
use ankitex_core::tools::{EtcPack, NvCompress};
use ankitex_core::{Collaborators, ConvertConfig, convert};
use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "ankitex",
    about = "Convert images into ANKITEX1 texture containers",
    version,
    author
)]
struct Cli {
    // Input/Output
    /// Source images (1 for 2D, 6 for Cube, one or more for 3D/2DArray)
    #[arg(short, long, num_args = 1.., required = true, help_heading = "Input/Output")]
    input: Vec<PathBuf>,
    /// Output file
    #[arg(short, long, help_heading = "Input/Output")]
    output: PathBuf,
    /// YAML config file path (overrides texture options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Texture
    /// Texture type: 2D|Cube|3D|2DArray
    #[arg(long = "type", default_value = "2D", help_heading = "Texture")]
    topology: String,
    /// Normal map (RGB only)
    #[arg(long, default_value_t = false, help_heading = "Texture")]
    normal: bool,
    /// Drop the alpha channel
    #[arg(long, default_value_t = false, help_heading = "Texture")]
    no_alpha: bool,
    /// Convert sRGB input to linear RGB (RGB only)
    #[arg(long, default_value_t = false, help_heading = "Texture")]
    to_linear_rgb: bool,
    /// Sampling hint for the runtime: default|linear|nearest
    #[arg(long, default_value = "default", help_heading = "Texture")]
    filter: String,
    /// Maximum number of mip levels
    #[arg(long, default_value_t = 0xFFFF, help_heading = "Texture")]
    mips_count: u32,
    /// Reject non-square images
    #[arg(long, default_value_t = false, help_heading = "Texture")]
    require_square: bool,

    // Storage
    /// Store uncompressed RGB(A) blocks
    #[arg(long, num_args = 0..=1, default_value_t = false, default_missing_value = "true", action = ArgAction::Set, help_heading = "Storage")]
    store_uncompressed: bool,
    /// Store S3TC (DXT1/DXT5) blocks
    #[arg(long, num_args = 0..=1, default_value_t = true, default_missing_value = "true", action = ArgAction::Set, help_heading = "Storage")]
    store_s3tc: bool,
    /// Store ETC2 blocks
    #[arg(long, num_args = 0..=1, default_value_t = false, default_missing_value = "true", action = ArgAction::Set, help_heading = "Storage")]
    store_etc: bool,
    /// Faster, lower quality block compression
    #[arg(long, default_value_t = false, help_heading = "Storage")]
    fast: bool,

    // Tools
    /// ImageMagick `convert` executable (etcpack also needs it)
    #[arg(long, default_value = "/usr/bin/convert", help_heading = "Tools")]
    convert_path: PathBuf,
    /// nvcompress executable
    #[arg(long, default_value = "nvcompress", help_heading = "Tools")]
    nvcompress: PathBuf,
    /// etcpack executable
    #[arg(long, default_value = "etcpack", help_heading = "Tools")]
    etcpack: PathBuf,
    /// Probe and resize in-process instead of through ImageMagick
    #[arg(long, default_value_t = false, help_heading = "Tools")]
    native_resize: bool,
    /// Encode units in parallel (requires the 'parallel' feature)
    #[arg(long, default_value_t = false, help_heading = "Tools")]
    parallel: bool,

    // Export
    /// Write the conversion report (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_report: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,

    // Logging/UX
    /// Show a progress spinner (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run_convert(&cli, cli.progress && !cli.quiet)
}

fn run_convert(cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    let base = config_from_cli(cli)?;
    let mut convert_path = cli.convert_path.clone();
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let Some(p) = &y.convert_path {
            convert_path = p.clone();
        }
        y.into_convert_config(base)?
    } else {
        base
    };

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    cfg.validate()?;
    let needs_convert = !cli.native_resize || cfg.compression.contains(CompressionMask::ETC2);
    if needs_convert && !convert_path.is_file() {
        anyhow::bail!(
            "convert tool not found at {} (set --convert-path)",
            convert_path.display()
        );
    }

    let mut tools = if cli.native_resize {
        Collaborators::native()
    } else {
        Collaborators::image_magick(&convert_path)
    };
    if cfg.compression.contains(CompressionMask::S3TC) {
        tools = tools.with_s3tc(Arc::new(NvCompress::new(&cli.nvcompress)));
    }
    if cfg.compression.contains(CompressionMask::ETC2) {
        tools = tools.with_etc2(Arc::new(EtcPack::new(&cli.etcpack, &convert_path)));
    }
    debug!(?cfg, convert = %convert_path.display(), "configuration");

    let spinner = show_progress.then(|| spinner(&cli.output));
    let start = Instant::now();
    let result = convert(&cli.input, &cli.output, &cfg, &tools);
    if let Some(s) = &spinner {
        s.finish_and_clear();
    }
    let report = result.with_context(|| format!("convert into {}", cli.output.display()))?;
    info!(
        output = %report.output.display(),
        time = %fmt_dur(start.elapsed()),
        "{}",
        report.summary()
    );

    if let Some(path) = &cli.export_report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
        info!(path = %path.display(), "wrote report");
    }
    Ok(())
}

fn config_from_cli(cli: &Cli) -> anyhow::Result<ConvertConfig> {
    let mut compression = CompressionMask::empty();
    compression.set(CompressionMask::RAW, cli.store_uncompressed);
    compression.set(CompressionMask::S3TC, cli.store_s3tc);
    compression.set(CompressionMask::ETC2, cli.store_etc);
    Ok(ConvertConfig::builder()
        .topology(parse_topology(&cli.topology)?)
        .fast(cli.fast)
        .normal(cli.normal)
        .no_alpha(cli.no_alpha)
        .compression(compression)
        .to_linear(cli.to_linear_rgb)
        .filter(parse_filter(&cli.filter)?)
        .max_mips(cli.mips_count)
        .require_square(cli.require_square)
        .parallel(cli.parallel)
        .build())
}

fn parse_topology(s: &str) -> anyhow::Result<TextureTopology> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown texture type: {} (2D|Cube|3D|2DArray)", s))
}

fn parse_filter(s: &str) -> anyhow::Result<TextureFilter> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown filter: {} (default|linear|nearest)", s))
}

fn spinner(output: &Path) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};
    let b = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_msg}") {
        b.set_style(style);
    }
    b.set_message(format!("converting {}", output.display()));
    b.enable_steady_tick(Duration::from_millis(100));
    b
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}ms", ms)
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    topology: Option<String>,
    fast: Option<bool>,
    normal: Option<bool>,
    no_alpha: Option<bool>,
    store_uncompressed: Option<bool>,
    store_s3tc: Option<bool>,
    store_etc: Option<bool>,
    to_linear_rgb: Option<bool>,
    filter: Option<String>,
    mips_count: Option<u32>,
    require_square: Option<bool>,
    parallel: Option<bool>,
    convert_path: Option<PathBuf>,
}

impl YamlConfig {
    fn into_convert_config(self, mut cfg: ConvertConfig) -> anyhow::Result<ConvertConfig> {
        if let Some(v) = self.topology {
            cfg.topology = parse_topology(&v)?;
        }
        if let Some(v) = self.fast {
            cfg.fast = v;
        }
        if let Some(v) = self.normal {
            cfg.normal = v;
        }
        if let Some(v) = self.no_alpha {
            cfg.no_alpha = v;
        }
        if let Some(v) = self.store_uncompressed {
            cfg.compression.set(CompressionMask::RAW, v);
        }
        if let Some(v) = self.store_s3tc {
            cfg.compression.set(CompressionMask::S3TC, v);
        }
        if let Some(v) = self.store_etc {
            cfg.compression.set(CompressionMask::ETC2, v);
        }
        if let Some(v) = self.to_linear_rgb {
            cfg.to_linear = v;
        }
        if let Some(v) = self.filter {
            cfg.filter = parse_filter(&v)?;
        }
        if let Some(v) = self.mips_count {
            cfg.max_mips = v;
        }
        if let Some(v) = self.require_square {
            cfg.require_square = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}
