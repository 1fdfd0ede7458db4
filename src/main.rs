// Console host for the dashboard.
//
// - Option [1] loads and reshapes both CSVs (once per process) and prints
//   load diagnostics.
// - Option [2] renders the current selection: table previews on the console,
//   chart specs written as JSON for a Vega-Lite renderer.
// - The remaining options change one selection value each; the next render
//   picks them up.
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std_dashboard::charts::GeoSource;
use std_dashboard::types::{SDH_INDICATORS, STD_INDICATORS};
use std_dashboard::util::format_int;
use std_dashboard::{cache, output, queries, DashboardConfig, LoadedData, Selection};

struct AppState {
    config: DashboardConfig,
    selection: Option<Selection>,
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice")
}

fn setup_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();
}

fn loaded() -> Option<&'static LoadedData> {
    let data = cache::cached();
    if data.is_none() {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
    }
    data
}

/// Handle option [1]: load both datasets into the process-wide cache.
fn handle_load(state: &mut AppState) {
    match cache::get_or_load(&state.config) {
        Ok(data) => {
            println!(
                "Processing datasets... (STD: {} rows read, {} kept after 2010; SDH: {} rows read)",
                format_int(data.std_report.total_rows),
                format_int(data.std_report.kept_rows),
                format_int(data.sdh_report.total_rows)
            );
            println!(
                "Joined table: {} state-years, {} indicator columns.\n",
                format_int(data.joined.len()),
                data.joined.columns.len()
            );
            if state.selection.is_none() {
                state.selection = Some(Selection::default_for(data, &state.config));
            }
        }
        Err(e) => {
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

/// Handle option [2]: render the current selection.
fn handle_render(state: &AppState) {
    let (Some(data), Some(selection)) = (loaded(), state.selection.as_ref()) else {
        return;
    };
    let geo = GeoSource::topojson(&state.config.geo_url, &state.config.geo_feature);
    let view = std_dashboard::render(data, &geo, selection);

    output::preview_table(
        &format!("STD Cases by States in {}", selection.year),
        Some(&format!("Total Cases of {:?}", selection.std_indicators)),
        &view.state_ranking,
        10,
    );
    output::preview_table(
        &format!("SDH Population Percent in {}", selection.state),
        None,
        &view.sdh_percent_table,
        12,
    );

    match output::write_charts(&state.config.output_dir, &view) {
        Ok(paths) => {
            println!("Chart specs written:");
            for p in paths {
                println!("  {}", p.display());
            }
            println!();
        }
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn handle_year(state: &mut AppState, data: &LoadedData) {
    let Some((min, max)) = queries::year_range(&data.combined) else {
        println!("No years available.\n");
        return;
    };
    let input = prompt(&format!("Year ({}-{})", min, max));
    match input.parse::<i32>() {
        Ok(y) if (min..=max).contains(&y) => {
            if let Some(sel) = state.selection.as_mut() {
                sel.year = y;
            }
        }
        _ => println!("Invalid year.\n"),
    }
}

fn handle_state(state: &mut AppState, data: &LoadedData) {
    let options = queries::state_options(&data.joined);
    let input = prompt("State name");
    match options.iter().find(|s| s.eq_ignore_ascii_case(&input)) {
        Some(name) => {
            if let Some(sel) = state.selection.as_mut() {
                sel.state = name.clone();
            }
        }
        None => println!("Unknown state: {}\n", input),
    }
}

/// Pick a subset by 1-based numbers, e.g. `1,3`. `all` selects every option,
/// an empty line clears the selection.
fn pick_indicators(title: &str, options: &[&str]) -> Option<Vec<String>> {
    println!("{}", title);
    for (i, o) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, o);
    }
    let input = prompt("Numbers (comma separated, 'all', or empty for none)");
    if input.eq_ignore_ascii_case("all") {
        return Some(options.iter().map(|s| s.to_string()).collect());
    }
    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => picked.push(options[n - 1].to_string()),
            _ => {
                println!("Invalid choice: {}\n", part);
                return None;
            }
        }
    }
    Some(picked)
}

fn pick_one(title: &str, options: &[&str]) -> Option<String> {
    let picked = pick_indicators(title, options)?;
    if picked.len() == 1 {
        picked.into_iter().next()
    } else {
        println!("Please choose exactly one.\n");
        None
    }
}

fn handle_scatter(state: &mut AppState) {
    let Some(x) = pick_one("Select STD (by Cases) Variable:", &STD_INDICATORS) else {
        return;
    };
    let Some(y) = pick_one("Select SDH (by Counts) Variable:", &SDH_INDICATORS) else {
        return;
    };
    if let Some(sel) = state.selection.as_mut() {
        sel.scatter_x = x;
        sel.scatter_y = y;
    }
}

fn print_menu(state: &AppState) {
    if let Some(sel) = &state.selection {
        println!(
            "Current selection: year {}, state {}, {} STD / {} SDH indicators",
            sel.year,
            sel.state,
            sel.std_indicators.len(),
            sel.sdh_indicators.len()
        );
    }
    println!("[1] Load the data");
    println!("[2] Render dashboard");
    println!("[3] Change year");
    println!("[4] Change state");
    println!("[5] Select STD indicators");
    println!("[6] Select SDH indicators");
    println!("[7] Choose scatterplot variables");
    println!("[0] Exit\n");
}

fn main() -> Result<()> {
    setup_logging();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())
        .context("Failed to load dashboard configuration")?;
    let mut state = AppState { config, selection: None };

    loop {
        print_menu(&state);
        match read_choice().as_str() {
            "1" => handle_load(&mut state),
            "2" => handle_render(&state),
            choice @ ("3" | "4" | "5" | "6" | "7") => {
                let Some(data) = loaded() else { continue };
                match choice {
                    "3" => handle_year(&mut state, data),
                    "4" => handle_state(&mut state, data),
                    "5" => {
                        if let Some(picked) = pick_indicators("STD indicators:", &STD_INDICATORS) {
                            if let Some(sel) = state.selection.as_mut() {
                                sel.std_indicators = picked;
                            }
                        }
                    }
                    "6" => {
                        if let Some(picked) =
                            pick_indicators("Social Determinants of Health indicators:", &SDH_INDICATORS)
                        {
                            if let Some(sel) = state.selection.as_mut() {
                                sel.sdh_indicators = picked;
                            }
                        }
                    }
                    _ => handle_scatter(&mut state),
                }
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from the menu.\n"),
        }
    }
    Ok(())
}
