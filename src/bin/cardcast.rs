use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cardcast", version, about = "Narrated text-card videos")]
struct Cli {
    /// JSON config file; environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single card as a PNG.
    Card(CardArgs),
    /// Render a card, synthesize narration and mux both into an MP4.
    Narrate(NarrateArgs),
    /// List the voices of a speech provider.
    Voices {
        /// Provider name (openai, elevenlabs, google, azure).
        provider: String,
    },
    /// List the built-in color templates.
    Templates,
    /// Inspect or clean the output directory.
    #[command(subcommand)]
    Storage(StorageCommand),
}

#[derive(Args, Debug)]
struct TextArgs {
    #[arg(long)]
    title: String,

    /// Body text; use --text-file for longer input.
    #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
    text: Option<String>,

    /// Read the body text from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    #[arg(long, default_value = "purple_blue")]
    template: String,

    #[arg(long, default_value = "msyh")]
    title_font: String,

    #[arg(long, default_value = "msyh")]
    body_font: String,
}

impl TextArgs {
    fn body(&self) -> anyhow::Result<String> {
        match (&self.text, &self.text_file) {
            (Some(t), _) => Ok(t.clone()),
            (None, Some(p)) => std::fs::read_to_string(p)
                .with_context(|| format!("read text file '{}'", p.display())),
            (None, None) => anyhow::bail!("either --text or --text-file is required"),
        }
    }

    fn request(&self) -> anyhow::Result<cardcast::RenderRequest> {
        let mut req = cardcast::RenderRequest::new(self.title.clone(), self.body()?);
        req.color_template = self.template.clone();
        req.title_font = self.title_font.clone();
        req.body_font = self.body_font.clone();
        Ok(req)
    }
}

#[derive(Args, Debug)]
struct CardArgs {
    #[command(flatten)]
    text: TextArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print the layout plan as JSON instead of drawing.
    #[arg(long)]
    plan: bool,
}

#[derive(Args, Debug)]
struct NarrateArgs {
    #[command(flatten)]
    text: TextArgs,

    #[arg(long, default_value = "openai")]
    provider: String,

    #[arg(long, default_value = "alloy")]
    voice: String,

    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    #[arg(long, default_value_t = 0.5)]
    stability: f32,

    /// Keep the card PNG and narration MP3 next to the video.
    #[arg(long)]
    keep_intermediates: bool,
}

#[derive(Subcommand, Debug)]
enum StorageCommand {
    /// Print directory statistics as JSON.
    Stats,
    /// Purge by age, then by size, and print the report.
    Reclaim,
    /// Reclaim on a fixed interval until interrupted.
    Watch {
        /// Seconds between runs; defaults to the configured cleanup interval.
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Stop after this many seconds instead of running forever.
        #[arg(long)]
        for_secs: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;
    let config = cardcast::AppConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Card(args) => cmd_card(&config, args),
        Command::Narrate(args) => cmd_narrate(&config, args),
        Command::Voices { provider } => cmd_voices(&config, &provider),
        Command::Templates => cmd_templates(),
        Command::Storage(cmd) => cmd_storage(&config, cmd),
    }
}

fn init_logging(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter '{default_filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{s}");
    Ok(())
}

fn cmd_card(config: &cardcast::AppConfig, args: CardArgs) -> anyhow::Result<()> {
    let req = args.text.request()?;
    req.validate(&config.limits)?;
    let job = req.trimmed().card_job(&args.out);
    let compositor = cardcast::CardCompositor::from_config(config);

    if args.plan {
        return print_json(&compositor.plan(&job)?);
    }
    let out = compositor.render(&job)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_narrate(config: &cardcast::AppConfig, args: NarrateArgs) -> anyhow::Result<()> {
    let mut req = args.text.request()?;
    req.voice_provider = args.provider;
    req.voice = args.voice;
    req.voice_speed = args.speed;
    req.voice_stability = args.stability;

    let narrator =
        cardcast::Narrator::from_config(config)?.keep_intermediates(args.keep_intermediates);
    let output = narrator.narrate(&req)?;
    print_json(&output)
}

fn cmd_voices(config: &cardcast::AppConfig, provider: &str) -> anyhow::Result<()> {
    let registry = cardcast::SpeechRegistry::from_config(&config.speech)?;
    let p = registry.get(provider)?;
    print_json(&serde_json::json!({
        "provider": p.name(),
        "available": p.is_available(),
        "voices": p.voices(),
    }))
}

fn cmd_templates() -> anyhow::Result<()> {
    let registry = cardcast::TemplateRegistry::builtin();
    let list: Vec<_> = registry
        .iter()
        .map(|(key, t)| serde_json::json!({ "key": key, "template": t }))
        .collect();
    print_json(&list)
}

fn storage_manager(config: &cardcast::AppConfig) -> anyhow::Result<cardcast::StorageManager> {
    Ok(cardcast::StorageManager::new(
        &config.output_dir,
        config.storage.policy(),
    )?)
}

fn cmd_storage(config: &cardcast::AppConfig, cmd: StorageCommand) -> anyhow::Result<()> {
    let manager = storage_manager(config)?;
    match cmd {
        StorageCommand::Stats => print_json(&manager.stats()?),
        StorageCommand::Reclaim => print_json(&manager.reclaim()),
        StorageCommand::Watch {
            interval_secs,
            for_secs,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.storage.cleanup_interval());
            watch(Arc::new(manager), interval, for_secs.map(Duration::from_secs))
        }
    }
}

fn watch(
    manager: Arc<cardcast::StorageManager>,
    interval: Duration,
    run_for: Option<Duration>,
) -> anyhow::Result<()> {
    print_json(&manager.reclaim())?;
    let scheduler = cardcast::ReclaimScheduler::start(Arc::clone(&manager), interval)?;
    match run_for {
        Some(d) => std::thread::sleep(d),
        None => loop {
            std::thread::sleep(Duration::from_secs(3600));
        },
    }
    let ticks = scheduler.stop();
    eprintln!(
        "stopped watching {} after {ticks} scheduled runs",
        manager.dir().display()
    );
    Ok(())
}
