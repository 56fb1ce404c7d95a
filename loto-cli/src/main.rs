mod display;
mod import;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use loto_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, migrate, open_db};
use loto_db::rusqlite::Connection;
use loto_ensemble::artifacts::ArtifactStore;
use loto_ensemble::config::PipelineConfig;
use loto_ensemble::features::number_features;
use loto_ensemble::registry::ModelRegistry;
use loto_ensemble::service::PredictionService;
use loto_ensemble::training::train_pipeline;
use loto_seq::config::{Encoding, ReadoutSolver};

use crate::display::{
    display_draws, display_import_summary, display_scores, display_stats, display_status,
    display_train_report,
};

#[derive(Parser)]
#[command(name = "loto", about = "Prévision des tirages du Loto (5 boules sur 49)")]
struct Cli {
    /// Répertoire des modèles entraînés
    #[arg(long, global = true, default_value = "models")]
    models: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (colonnes boule1..boule5, chance et date optionnelles)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Statistiques par numéro (fréquences, retard, score heuristique)
    Stats {
        /// Nombre de numéros à afficher
        #[arg(short, long, default_value = "49")]
        top: usize,
    },

    /// Entraîner les deux prédicteurs sur tout l'historique
    Train {
        /// Fichier de configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        version: Option<String>,
        #[arg(long)]
        window_length: Option<usize>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        encoding: Option<Encoding>,
        /// Readout : logistic (BCE) ou ridge
        #[arg(long)]
        solver: Option<ReadoutSolver>,
        /// Seed pour la reproductibilité (aléatoire sinon)
        #[arg(long)]
        seed: Option<u64>,
        /// Pas de forêt aléatoire : le score statistique reste heuristique
        #[arg(long)]
        no_forest: bool,
    },

    /// Prédire le prochain tirage
    Predict {
        #[arg(short, long, default_value = "latest")]
        version: String,
        /// Nombre de numéros à afficher
        #[arg(short, long, default_value = "10")]
        top: usize,
        /// Carte de scores JSON sur la sortie standard
        #[arg(long)]
        json: bool,
    },

    /// État des prédicteurs chargés
    Status {
        #[arg(short, long, default_value = "latest")]
        version: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;
    let store = ArtifactStore::new(&cli.models);

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { top } => cmd_stats(&conn, top),
        Command::Train {
            config,
            version,
            window_length,
            epochs,
            encoding,
            solver,
            seed,
            no_forest,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(version) = version {
                config.version = version;
            }
            if let Some(window_length) = window_length {
                config.sequence.window_length = window_length;
            }
            if let Some(epochs) = epochs {
                config.sequence.epochs = epochs;
            }
            if let Some(encoding) = encoding {
                config.sequence.encoding = encoding;
            }
            if let Some(solver) = solver {
                config.sequence.solver = solver;
            }
            if let Some(seed) = seed {
                config.sequence.seed = Some(seed);
                config.forest.seed = Some(seed);
            }
            if no_forest {
                config.use_forest = false;
            }
            cmd_train(&conn, &store, &config)
        }
        Command::Predict { version, top, json } => cmd_predict(&conn, store, &version, top, json),
        Command::Status { version } => cmd_status(store, &version),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Configuration invalide: {:?}", path))
}

fn ensure_history(conn: &Connection) -> Result<bool> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : loto import --file <csv>");
        return Ok(false);
    }
    Ok(true)
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if !ensure_history(conn)? {
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, top: usize) -> Result<()> {
    if !ensure_history(conn)? {
        return Ok(());
    }
    let history = fetch_history(conn)?;
    display_stats(&number_features(&history), history.len(), top);
    Ok(())
}

fn cmd_train(conn: &Connection, store: &ArtifactStore, config: &PipelineConfig) -> Result<()> {
    if !ensure_history(conn)? {
        return Ok(());
    }
    let history = fetch_history(conn)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Entraînement sur {} tirages...", history.len()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let trained = train_pipeline(&history, config);
    pb.finish_and_clear();
    let trained = trained.context("Échec de l'entraînement")?;

    let written = trained
        .persist(store)
        .with_context(|| format!("Impossible d'écrire les modèles dans {:?}", store.root()))?;
    display_train_report(&trained, &written);
    Ok(())
}

fn cmd_predict(
    conn: &Connection,
    store: ArtifactStore,
    version: &str,
    top: usize,
    json: bool,
) -> Result<()> {
    let registry = Arc::new(ModelRegistry::new(store));
    registry
        .reload(version)
        .with_context(|| format!("Impossible de charger la version {}", version))?;
    let service = PredictionService::new(registry);
    let history = fetch_history(conn)?;

    if json {
        let scores = service.predict_or_empty(&history);
        println!("{}", serde_json::to_string(&scores)?);
        return Ok(());
    }

    let scores = service.predict(&history).context("Prédiction impossible")?;
    display_scores(&scores, top);
    Ok(())
}

fn cmd_status(store: ArtifactStore, version: &str) -> Result<()> {
    let versions = store.versions()?;
    let registry = ModelRegistry::new(store);
    let status = registry
        .reload(version)
        .with_context(|| format!("Impossible de charger la version {}", version))?;
    display_status(&status, &versions);
    Ok(())
}
