use clap::Parser;
use product_detect::{cli, config, error, image_source, logging, report, session, workflow};
use cli::{Cli, Commands};
use config::Config;
use error::{DetectError, Result};
use workflow::{DetectionWorkflow, ImageAsset, WorkflowState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Detect { image, products, output, json } => {
            let config = Config::load()?;
            let mut workflow = DetectionWorkflow::from_config(&config)?;
            // APIキーがなければ画像読み込み・商品名入力の前に終了
            if let Err(e) = workflow.require_configured() {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }

            // 1. 画像読み込み
            let loaded = image_source::load_image(&image)?;
            let file_name = loaded.file_name.clone();
            let asset = ImageAsset::new(loaded.bytes, loaded.mime_type.clone()).with_name(loaded.file_name);
            if !workflow.set_image(asset) {
                return Err(DetectError::UnsupportedMediaType(format!(
                    "{} ({})",
                    image.display(),
                    loaded.mime_type
                )));
            }

            // 2. 商品名
            let names = if products.is_empty() {
                session::prompt_product_names()?
            } else {
                products
            };
            for (i, name) in names.into_iter().enumerate() {
                if i > 0 {
                    workflow.add_product_slot();
                }
                workflow.set_product(i, name);
            }

            // 3. 解析
            if !json {
                println!("📸 product-detect - 商品検出\n");
                println!("画像: {}", file_name);
                println!("商品: {}\n", workflow.query().trimmed_names().join(", "));
            }
            session::run_with_spinner(&mut workflow, !json).await;

            // 4. 結果
            match workflow.state() {
                WorkflowState::Completed(result) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(result)?);
                    } else {
                        println!("{}", report::render_table(result));
                    }

                    if let Some(path) = output {
                        report::DetectionReport::new(&file_name, result).save(&path)?;
                        if !json {
                            println!("\n✔ 結果を保存: {}", path.display());
                        }
                    }
                }
                WorkflowState::Failed(failure) => {
                    eprintln!("✗ {}", failure);
                    std::process::exit(1);
                }
                other => {
                    eprintln!("✗ 予期しない状態: {}", other.name());
                    std::process::exit(1);
                }
            }
        }

        Commands::Session => {
            let config = Config::load()?;
            let mut workflow = DetectionWorkflow::from_config(&config)?;
            session::run_interactive_session(&mut workflow).await?;
        }

        Commands::Config { set_api_key, show } => {
            let mut config = Config::load_or_default();

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  temperature: {}", config.temperature);
                match config.get_api_key() {
                    Ok(key) => println!("  APIキー: {}", config::mask_key(&key)),
                    Err(_) => println!("  APIキー: 未設定"),
                }
            }
        }
    }

    Ok(())
}
