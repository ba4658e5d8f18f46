use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use prop_tensor::config::AppConfig;
use prop_tensor::matchup_load::{EspnSource, load_matchup};
use prop_tensor::prop_derive::{PropType, derive_value};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = AppConfig::from_env();

    let mut args = std::env::args().skip(1);
    let team = args.next().unwrap_or_else(|| "MIN".to_string());
    let opponent = args.next().unwrap_or_else(|| "DEN".to_string());
    let player = args.next().unwrap_or_else(|| "Anthony Edwards".to_string());
    let prop = match args.next() {
        Some(raw) => raw
            .parse::<PropType>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("parse prop {raw}"))?,
        None => PropType::Points,
    };

    let source = EspnSource::new(config.fetch_timeout).context("build http client")?;
    let data = load_matchup(&source, &team, &opponent, &player);

    println!("{team} roster ({}):", data.team_roster.entries.len());
    for entry in &data.team_roster.entries {
        println!("  {:>10}  {:<3} {}", entry.id, entry.position, entry.display_name);
    }
    println!("{opponent} roster: {}", data.opponent_roster.name_list());

    let Some(id) = data.player_id.as_deref() else {
        eprintln!("{player} not found on the {team} roster.");
        return Ok(());
    };
    println!("\n{player} (id={id}) last {} games, {}:", data.game_log.len(), prop.label());
    if !prop.has_derivation() {
        println!("  ({} has no box-score derivation; values show as 0)", prop.label());
    }
    for row in &data.game_log {
        println!(
            "  {:<12} vs {:<4} {:<2} {:>3} MIN  FG {:<6} 3PT {:<6} FT {:<6} => {}",
            row.date,
            row.opponent_abbrev,
            row.result,
            row.minutes,
            row.field_goals.to_string(),
            row.three_pointers.to_string(),
            row.free_throws.to_string(),
            derive_value(row, prop).render(prop),
        );
    }
    Ok(())
}
