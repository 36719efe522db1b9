use anyhow::Result;
use clap::Parser;

use test_case_tagger::cli::{Cli, Commands};
use test_case_tagger::orchestrator::{ClassifyInput, HistoryScope};
use test_case_tagger::utils::logging;
use test_case_tagger::{App, AppError, Config, UserId};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path).map_err(AppError::from)?,
        None => Config::from_env(),
    };
    if cli.verbose {
        config.verbose_logging = true;
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config).await?;

    match cli.command {
        Commands::Classify(args) => {
            let user_id = UserId::new(args.user.user);
            let input = match (args.source.text, args.source.csv) {
                (Some(text), _) => ClassifyInput::Text(text),
                (None, Some(path)) => ClassifyInput::Csv(path),
                (None, None) => anyhow::bail!("需要 --text 或 --csv"),
            };
            app.classify(&user_id, input, args.export.as_deref()).await?;
        }
        Commands::History(args) => {
            let user_id = UserId::new(args.user.user);
            let scope = if args.all {
                HistoryScope::All
            } else {
                HistoryScope::Pages(args.pages.max(1))
            };
            app.history(&user_id, args.date.as_deref(), scope, args.export.as_deref())
                .await?;
        }
        Commands::Erase(args) => {
            let user_id = UserId::new(args.user.user);
            app.erase(&user_id, args.yes).await?;
        }
    }

    Ok(())
}
