use clap::Parser;
use miette::Result;
use tbom::cli::logging::init_tracing;
use tbom::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Generate(args) => tbom::cli::commands::generate::run(args, &global),
        Commands::Inspect(args) => tbom::cli::commands::inspect::run(args, &global),
        Commands::Columns(args) => tbom::cli::commands::columns::run(args, &global),
        Commands::Completions(args) => tbom::cli::commands::completions::run(args),
    }
}
