use std::path::PathBuf;

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use loto_db::models::Draw;
use loto_ensemble::ensemble::ScoreMap;
use loto_ensemble::features::NumberFeatures;
use loto_ensemble::models::heuristic::heuristic_score;
use loto_ensemble::registry::{Availability, RegistryStatus};
use loto_ensemble::training::TrainedPipeline;
use loto_seq::metrics::random_baseline;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Boules", "Chance"]);
    for draw in draws {
        let mut sorted_balls = draw.balls;
        sorted_balls.sort();
        let balls_str = sorted_balls
            .iter()
            .map(|b| format!("{:2}", b))
            .collect::<Vec<_>>()
            .join(" - ");

        table.add_row(vec![
            draw.date.format("%d/%m/%Y").to_string(),
            balls_str,
            draw.chance.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.dropped > 0 {
        println!("  Tirages invalides : {}", result.dropped);
    }
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(features: &[NumberFeatures], history_len: usize, top: usize) {
    println!("\n📊 Statistiques sur {} tirages\n", history_len);

    let mut rows: Vec<(&NumberFeatures, f64)> =
        features.iter().map(|f| (f, heuristic_score(f))).collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut table =
        new_table(vec!["Numéro", "Fréq. 10", "Fréq. 50", "Retard", "Pair", "Haut", "Score"]);
    for (f, score) in rows.into_iter().take(top) {
        table.add_row(vec![
            format!("{:2}", f.number),
            f.recent_frequency.to_string(),
            f.long_frequency.to_string(),
            f.gap.to_string(),
            f.parity.to_string(),
            f.high_low.to_string(),
            format!("{:.2}", score),
        ]);
    }
    println!("{table}");
}

pub fn display_train_report(trained: &TrainedPipeline, written: &[PathBuf]) {
    let report = &trained.sequence_report;
    println!("\n🧠 Entraînement terminé (version {})\n", trained.version);

    let mut table = new_table(vec!["Métrique", "Valeur"]);
    table.add_row(vec!["Tirages".to_string(), trained.history_len.to_string()]);
    table.add_row(vec!["Fenêtres".to_string(), report.windows.to_string()]);
    table.add_row(vec!["Fenêtres de validation".to_string(), report.holdout_windows.to_string()]);
    table.add_row(vec!["Perte (BCE)".to_string(), format!("{:.4}", report.train_loss)]);
    table.add_row(vec![
        "Top-5 validation".to_string(),
        format!("{:.3} (aléatoire {:.3})", report.holdout_top5_hit_rate, random_baseline(5)),
    ]);
    table.add_row(vec![
        "Top-10 validation".to_string(),
        format!("{:.3} (aléatoire {:.3})", report.holdout_top10_hit_rate, random_baseline(10)),
    ]);
    table.add_row(vec!["Seed".to_string(), report.seed.to_string()]);
    table.add_row(vec!["Durée".to_string(), format!("{} ms", report.train_time_ms)]);
    table.add_row(vec![
        "Forêt".to_string(),
        trained
            .forest
            .as_ref()
            .map_or("non (heuristique)".to_string(), |f| format!("{} arbres", f.n_trees())),
    ]);
    println!("{table}");

    for path in written {
        println!("Modèle sauvegardé : {}", path.display());
    }
}

pub fn display_scores(scores: &ScoreMap, top: usize) {
    if scores.is_empty() {
        println!("Aucune prédiction disponible.");
        return;
    }

    println!("\n🎯 Scores fusionnés (top {top})\n");
    let mut table = new_table(vec!["#", "Numéro", "Score"]);
    for (rank, (number, score)) in scores.top(top).into_iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            format!("{:2}", number),
            format!("{:.2}", score),
        ]);
    }
    println!("{table}");
}

pub fn display_status(status: &RegistryStatus, versions: &[String]) {
    let color = |a: Availability| match a {
        Availability::Loaded => Color::Green,
        Availability::Fallback => Color::Yellow,
        Availability::Unavailable => Color::Red,
    };

    println!("Version : {}", status.version.as_deref().unwrap_or("—"));
    let mut table = new_table(vec!["Prédicteur", "État"]);
    table.add_row(vec![
        Cell::new("séquence"),
        Cell::new(status.sequence.to_string()).fg(color(status.sequence)),
    ]);
    table.add_row(vec![
        Cell::new("statistique"),
        Cell::new(status.statistical.to_string()).fg(color(status.statistical)),
    ]);
    println!("{table}");

    if versions.is_empty() {
        println!("Aucune version entraînée.");
    } else {
        println!("Versions disponibles : {}", versions.join(", "));
    }
}
