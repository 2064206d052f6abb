use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use zsentinel::api;
use zsentinel::buffer::ProtocolFilter;
use zsentinel::cli::{Cli, Command, OracleChoice};
use zsentinel::config::Config;
use zsentinel::log_mode::LogMode;
use zsentinel::models::{PacketStatus, TrafficMode};
use zsentinel::oracle::{SignatureOracle, UnavailableOracle, VerdictOracle};
use zsentinel::random::{shared, SharedRandom, ThreadRandom};
use zsentinel::services::SentinelService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Le logger n'est pas encore initialisé: les erreurs de chargement vont sur stderr
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration illisible ({:#}), utilisation des valeurs par défaut", e);
        Config::default()
    });

    init_logging(&config);

    let random = random_source(cli.seed, 0);
    let oracle: Arc<dyn VerdictOracle> = match cli.oracle {
        OracleChoice::Signature => Arc::new(SignatureOracle::with_random(random_source(cli.seed, 1))),
        OracleChoice::Unavailable => {
            warn!("Oracle injoignable: toutes les analyses passeront en fail-open");
            Arc::new(UnavailableOracle)
        }
    };

    let config = Arc::new(RwLock::new(config));
    let service = Arc::new(SentinelService::new(config.clone(), oracle, random).await);

    match cli.command {
        Command::Simulate {
            duration,
            mode,
            mitigation,
            inspect,
        } => simulate(service, duration, mode, mitigation, inspect).await,
        Command::Serve { bind } => {
            let bind = match bind {
                Some(bind) => bind,
                None => config.read().await.api_bind.clone(),
            };
            serve(service, &bind).await
        }
        Command::Shell => shell(service).await,
        Command::Analyze {
            analysis_type,
            content,
        } => {
            let result = service.analyze_content(analysis_type, &content).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    match config.log_mode {
        LogMode::File => {
            env_logger::init_from_env(env_logger::Env::default().default_filter_or(&config.log_level));
        }
        LogMode::SystemdJournal => {
            #[cfg(feature = "systemd")]
            {
                use systemd_journal_logger::JournalLog;

                let log_level = match config.log_level.to_lowercase().as_str() {
                    "trace" => log::LevelFilter::Trace,
                    "debug" => log::LevelFilter::Debug,
                    "warn" => log::LevelFilter::Warn,
                    "error" => log::LevelFilter::Error,
                    _ => log::LevelFilter::Info,
                };

                match JournalLog::new() {
                    Ok(logger) => {
                        if let Err(e) = logger
                            .with_syslog_identifier("zsentinel".to_string())
                            .install()
                        {
                            eprintln!("Erreur lors de l'installation du logger systemd: {}", e);
                            env_logger::init_from_env(
                                env_logger::Env::default().default_filter_or(&config.log_level),
                            );
                        } else {
                            log::set_max_level(log_level);
                            info!("Logger systemd initialisé avec niveau: {}", config.log_level);
                        }
                    }
                    Err(e) => {
                        eprintln!("Erreur lors de l'initialisation du logger systemd: {}", e);
                        env_logger::init_from_env(
                            env_logger::Env::default().default_filter_or(&config.log_level),
                        );
                    }
                }
            }

            #[cfg(not(feature = "systemd"))]
            {
                eprintln!("AVERTISSEMENT: le mode SystemdJournal n'est pas disponible (feature 'systemd' non activée). Utilisation du logger standard à la place.");
                env_logger::init_from_env(env_logger::Env::default().default_filter_or(&config.log_level));
            }
        }
    }
}

/// Source d'aléa; avec une graine, chaque consommateur reçoit un flux distinct
fn random_source(seed: Option<u64>, stream: u64) -> SharedRandom {
    match seed {
        Some(seed) => shared(ThreadRandom::with_seed(seed.wrapping_add(stream))),
        None => shared(ThreadRandom::new()),
    }
}

async fn simulate(
    service: Arc<SentinelService>,
    duration: u64,
    mode: TrafficMode,
    mitigation: bool,
    inspect: bool,
) -> anyhow::Result<()> {
    service.set_traffic_mode(mode).await;
    service.set_mitigation(mitigation).await;
    service.start_monitoring().await;
    service.start_dos_simulation().await;
    info!("Simulation de {} s (mode {}, mitigation {})", duration, mode, mitigation);

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;
    let deadline = tokio::time::sleep(Duration::from_secs(duration));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interruption reçue, arrêt de la simulation");
                break;
            }
            _ = interval.tick() => {
                if inspect {
                    let pending: Vec<String> = service
                        .packets(ProtocolFilter::All)
                        .await
                        .into_iter()
                        .filter(|packet| packet.status == PacketStatus::Pending)
                        .map(|packet| packet.id)
                        .collect();
                    for id in pending {
                        let service = service.clone();
                        tokio::spawn(async move {
                            service.inspect_packet(&id).await;
                        });
                    }
                }

                let snapshot = service.dos_snapshot().await;
                if let Some(sample) = snapshot.latest {
                    println!(
                        "[{}] rps={:.1} latence={:.1}ms ips={} écartées={}",
                        snapshot.mode, sample.rps, sample.latency_ms, sample.active_ips, snapshot.dropped
                    );
                }
            }
        }
    }

    service.shutdown().await;
    println!("\n{}", service.dashboard_report().await);
    Ok(())
}

async fn serve(service: Arc<SentinelService>, bind: &str) -> anyhow::Result<()> {
    service.start_dos_simulation().await;

    let router = api::create_router(service.clone());
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Impossible d'écouter sur {}", bind))?;
    info!("API de contrôle à l'écoute sur {}", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Erreur lors de l'attente du signal d'arrêt: {}", e);
            }
        })
        .await
        .context("Erreur du serveur API")?;

    service.shutdown().await;
    Ok(())
}

async fn shell(service: Arc<SentinelService>) -> anyhow::Result<()> {
    service.start_dos_simulation().await;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"zsentinel - tapez 'help' pour la liste des commandes\n")
        .await?;

    loop {
        stdout.write_all(b"zsentinel> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = line.trim();
        if command == "exit" || command == "quit" {
            break;
        }

        let output = match service.handle_command(command).await {
            Ok(output) => output,
            Err(e) => format!("Erreur: {:#}", e),
        };
        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
    }

    service.shutdown().await;
    Ok(())
}
