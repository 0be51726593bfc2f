use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sym_core::ResourceKind;
use sym_simulation::{Dashboard, Population, SimEventKind};

use super::{EVENT_LOG_CAPACITY, RunOptions};

pub fn run(opts: &RunOptions, rows: usize, verbose: bool, check: bool) -> Result<(), String> {
    let pop = super::simulate(opts, check)?;
    let stats = pop.stats();

    // Header
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!("({} ticks, seed={}, dt={}s)", opts.ticks, opts.seed, opts.dt).dimmed()
    );
    println!(
        "  {} alive, {} died, {} links, {} adversarial",
        stats.alive, stats.deaths, stats.links, stats.adversarial
    );
    println!(
        "  Mean health {:.2}, {:.1}s simulated",
        stats.mean_health,
        pop.clock().elapsed()
    );
    if check {
        println!("  {}", "Invariants held on every tick".green());
    }
    println!();

    print_events(&pop, verbose, stats.deaths);

    // Dashboard
    let dashboard = Dashboard::new(pop.dashboard(), rows);
    if dashboard.rows().is_empty() {
        println!("  {}", "No agents left alive.".dimmed());
        return Ok(());
    }

    println!("  {}", "Health Dashboard".bold().underline());
    println!(
        "  {}",
        format!(
            "least healthy first, showing {} of {}",
            dashboard.visible().len(),
            dashboard.rows().len()
        )
        .dimmed()
    );
    println!();

    let max_level = pop.config().resources.max_level;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec!["Agent".to_string()];
    header.extend(ResourceKind::ALL.iter().map(|k| capitalize(k.as_str())));
    header.extend(["Health".to_string(), "Links".to_string(), "Kind".to_string()]);
    table.set_header(header);

    for row in dashboard.visible() {
        let mut cells = vec![row.id.to_string()];
        for kind in ResourceKind::ALL {
            let level = row.levels.get(&kind).copied().unwrap_or(0.0);
            cells.push(format_level_bar(level, max_level));
        }
        cells.push(format!("{:.2}", row.health));
        cells.push(row.link_count.to_string());
        cells.push(if row.adversarial {
            "adversarial".red().to_string()
        } else {
            "honest".blue().to_string()
        });
        table.add_row(cells);
    }

    println!("{table}");
    println!();

    Ok(())
}

fn print_events(pop: &Population, verbose: bool, total_deaths: u64) {
    let events = pop.events().events();
    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in events {
            let tick_label = format!("[tick {:>3}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if events.is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
        return;
    }

    let deaths: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, SimEventKind::AgentDied { .. }))
        .collect();
    let hidden = hidden_deaths_note(deaths.len(), total_deaths);
    if !deaths.is_empty() || hidden.is_some() {
        println!("  {}", "Notable Events".bold().underline());
        for event in &deaths {
            println!("  {}  {}", "DEATH".red().bold(), event.description);
        }
        if let Some(note) = hidden {
            println!("  {}", note.dimmed());
        }
        println!();
    }
}

/// Deaths older than the event log's window are counted but not listed.
fn hidden_deaths_note(shown: usize, total: u64) -> Option<String> {
    let hidden = total.saturating_sub(shown as u64);
    (hidden > 0).then(|| {
        format!("... and {hidden} earlier deaths no longer in the {EVENT_LOG_CAPACITY}-event log")
    })
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::AgentDied { .. } => description.red().bold(),
        SimEventKind::LinkRetracted { .. } => description.yellow(),
        SimEventKind::LinkFormed { .. } => description.green(),
        SimEventKind::BoundaryReflected { .. } => description.blue(),
        SimEventKind::Seeded { .. } | SimEventKind::Swept { .. } => description.dimmed(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_level_bar(level: f64, max_level: f64) -> String {
    let frac = (level / max_level).clamp(0.0, 1.0);
    let filled = (frac * 10.0).round() as usize;
    let empty = 10_usize.saturating_sub(filled);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));

    if frac <= 0.15 {
        format!("[{}] {:>5.2}", bar.red(), level)
    } else if frac <= 0.4 {
        format!("[{}] {:>5.2}", bar.yellow(), level)
    } else {
        format!("[{}] {:>5.2}", bar.green(), level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bar_scales_to_ceiling() {
        colored::control::set_override(false);
        assert_eq!(format_level_bar(20.0, 20.0), "[##########] 20.00");
        assert_eq!(format_level_bar(0.0, 20.0), "[----------]  0.00");
        assert_eq!(format_level_bar(10.0, 20.0), "[#####-----] 10.00");
    }

    #[test]
    fn hidden_deaths_counted_when_log_dropped_them() {
        assert_eq!(hidden_deaths_note(3, 3), None);
        assert_eq!(
            hidden_deaths_note(2, 9).as_deref(),
            Some("... and 7 earlier deaths no longer in the 500-event log")
        );
    }

    #[test]
    fn capitalize_names() {
        assert_eq!(capitalize("sugar"), "Sugar");
        assert_eq!(capitalize(""), "");
    }
}
