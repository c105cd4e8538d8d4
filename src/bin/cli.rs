use std::env;
use std::fs;
use std::io::{self, Write};

use schedule_engine::export::{render_df_as_text_table, to_dataframe, ScheduleDocument};
use schedule_engine::persistence::{
    load_project_from_json, load_tasks_from_csv, save_project_to_json,
};
use schedule_engine::telemetry::init_tracing;
use schedule_engine::{
    Assignment, Dependency, DependencyKind, EngineConfig, LevelingMode, Project, ProjectMetadata,
    Resource, ResourceCalendar, ScheduleEngine, Task,
};

fn print_help() {
    println!(
        "Commands:\n  help                                     Show this help\n  show                                     Show tasks (and computed dates)\n  task <id> <name> <duration> [earliest]   Upsert a task\n  dep <pred> <succ> [FS|SS|FF|SF] [lag]    Add a dependency\n  resource <id> <capacity> [off_csv]       Add a resource (off periods like 4,5)\n  assign <task> <resource> <alloc> [units] Assign a resource to a task\n  compute                                  Run the critical path calculation\n  level [within-float|allow-extension]     Level resources\n  baseline create <label...>               Snapshot the computed schedule\n  baseline list                            List baselines\n  baseline compare <version>               Variance against a baseline\n  export <json|csv|table> [path]           Export the computed schedule\n  save <path.json>                         Save the project\n  load <path.json>                         Load a project\n  import <path.csv>                        Load tasks from a CSV table\n  quit|exit                                Exit"
    );
}

fn parse_periods(csv: &str) -> Result<Vec<i64>, String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| format!("invalid period '{s}'")))
        .collect()
}

fn show(project: &Project) {
    match ScheduleDocument::build(project) {
        Ok(document) => match to_dataframe(&document.tasks) {
            Ok(df) => println!("{}", render_df_as_text_table(&df)),
            Err(e) => println!("Error: {}", e),
        },
        Err(_) => {
            let mut tasks: Vec<&Task> = project.tasks().iter().collect();
            tasks.sort_by_key(|task| task.id);
            for task in tasks {
                println!("{:>4}  {:<24} duration={}", task.id, task.name, task.duration);
            }
            println!("(not computed; run 'compute')");
        }
    }
}

fn load_config() -> EngineConfig {
    let loaded = match env::args().nth(1) {
        Some(path) => EngineConfig::from_json_file(&path).and_then(EngineConfig::with_env_overrides),
        None => EngineConfig::from_env(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Config error: {e}; using defaults");
        EngineConfig::default()
    })
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let engine = ScheduleEngine::new(load_config());
    let mut project = Project::new(ProjectMetadata::default());

    println!("Schedule Engine (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() { continue; }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => show(&project),
            "task" => {
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(id_s), Some(name), Some(dur_s)) => {
                        let id: i32 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let duration: i64 = match dur_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid duration"); continue; } };
                        let mut task = Task::new(id, name, duration);
                        if let Some(es) = parts.next() {
                            match es.parse() { Ok(v) => task.earliest_start = Some(v), Err(_) => { println!("Invalid earliest start"); continue; } }
                        }
                        project.upsert_task(task);
                        println!("Task {} upserted.", id);
                    }
                    _ => println!("Usage: task <id> <name> <duration> [earliest]"),
                }
            }
            "dep" => {
                match (parts.next(), parts.next()) {
                    (Some(pred_s), Some(succ_s)) => {
                        let pred: i32 = match pred_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid predecessor"); continue; } };
                        let succ: i32 = match succ_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid successor"); continue; } };
                        let kind = match parts.next().map(str::parse::<DependencyKind>).transpose() { Ok(v) => v.unwrap_or_default(), Err(e) => { println!("Error: {}", e); continue; } };
                        let lag = match parts.next().map(str::parse::<i64>).transpose() { Ok(v) => v.unwrap_or(0), Err(_) => { println!("Invalid lag"); continue; } };
                        project.add_dependency(Dependency::new(pred, succ, kind, lag));
                        println!("Dependency {} -> {} ({}{:+}) added.", pred, succ, kind, lag);
                    }
                    _ => println!("Usage: dep <pred> <succ> [FS|SS|FF|SF] [lag]"),
                }
            }
            "resource" => {
                match (parts.next(), parts.next()) {
                    (Some(id), Some(cap_s)) => {
                        let capacity: f64 = match cap_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid capacity"); continue; } };
                        let off = match parts.next().map(parse_periods).transpose() { Ok(v) => v.unwrap_or_default(), Err(e) => { println!("Error: {}", e); continue; } };
                        let resource = Resource::new(id, capacity)
                            .with_calendar(ResourceCalendar::with_unavailable(off));
                        match project.add_resource(resource) {
                            Ok(_) => println!("Resource {} added.", id),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: resource <id> <capacity> [off_csv]"),
                }
            }
            "assign" => {
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(task_s), Some(resource), Some(alloc_s)) => {
                        let task_id: i32 = match task_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid task id"); continue; } };
                        let allocation: f64 = match alloc_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid allocation"); continue; } };
                        let mut assignment = Assignment::new(task_id, resource, allocation);
                        if let Some(units_s) = parts.next() {
                            match units_s.parse() { Ok(v) => assignment.units = v, Err(_) => { println!("Invalid units"); continue; } }
                        }
                        match project.assign(assignment) {
                            Ok(_) => println!("Task {} assigned to {}.", task_id, resource),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: assign <task> <resource> <alloc> [units]"),
                }
            }
            "compute" => {
                match engine.compute_critical_path(&mut project) {
                    Ok(schedule) => println!("Computed ({})", schedule.summary().to_cli_summary()),
                    Err(e) => println!("Compute error: {}", e),
                }
            }
            "level" => {
                let mode = match parts.next().map(str::parse::<LevelingMode>).transpose() { Ok(v) => v, Err(e) => { println!("Error: {}", e); continue; } };
                match engine.level_resources(&mut project, mode) {
                    Ok(outcome) => {
                        println!(
                            "Leveled ({}, {} shifted, {} conflicts left, finish={})",
                            outcome.mode,
                            outcome.shifts.len(),
                            outcome.conflicts.len(),
                            outcome.schedule.project_finish()
                        );
                        for shift in &outcome.shifts {
                            println!("  task {} delayed {} -> {}", shift.task_id, shift.original_start, shift.leveled_start);
                        }
                        for conflict in &outcome.conflicts {
                            println!("  unresolved: {}", conflict);
                        }
                    }
                    Err(e) => println!("Leveling error: {}", e),
                }
            }
            "baseline" => {
                match parts.next() {
                    Some("create") => {
                        let label = parts.collect::<Vec<_>>().join(" ");
                        match engine.create_baseline(&mut project, &label) {
                            Ok(version) => println!("Baseline {} created.", version),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Some("list") => {
                        for baseline in project.baselines() {
                            println!(
                                "  v{}  {}  finish={}  {}",
                                baseline.version(),
                                baseline.created_at().format("%Y-%m-%d %H:%M"),
                                baseline.project_finish(),
                                baseline.label()
                            );
                        }
                    }
                    Some("compare") => {
                        let version = match parts.next().map(str::parse::<u32>) { Some(Ok(v)) => v, _ => { println!("Usage: baseline compare <version>"); continue; } };
                        match engine.compare_to_baseline(&project, version) {
                            Ok(report) => {
                                println!("Project finish variance: {:+}", report.project_finish_variance);
                                for entry in &report.entries {
                                    println!("  task {} finish {} -> {} ({:+})", entry.task_id, entry.baseline_finish, entry.current_finish, entry.finish_variance);
                                }
                                if !report.added.is_empty() { println!("  added: {:?}", report.added); }
                                if !report.removed.is_empty() { println!("  removed: {:?}", report.removed); }
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: baseline <create <label>|list|compare <version>>"),
                }
            }
            "export" => {
                let Some(format) = parts.next() else { println!("Usage: export <json|csv|table> [path]"); continue; };
                match engine.export_schedule(&project, format) {
                    Ok(bytes) => match parts.next() {
                        Some(path) => match fs::write(path, &bytes) {
                            Ok(_) => println!("Exported {} bytes to {}.", bytes.len(), path),
                            Err(e) => println!("Error: {}", e),
                        },
                        None => println!("{}", String::from_utf8_lossy(&bytes)),
                    },
                    Err(e) => println!("Export error: {}", e),
                }
            }
            "save" => {
                let Some(path) = parts.next() else { println!("Usage: save <path.json>"); continue; };
                match save_project_to_json(&project, path) {
                    Ok(_) => println!("Saved to {}.", path),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "load" | "import" => {
                let Some(path) = parts.next() else { println!("Usage: {} <path>", cmd); continue; };
                let loaded = if cmd == "load" { load_project_from_json(path) } else { load_tasks_from_csv(path) };
                match loaded {
                    Ok(p) => {
                        project = p;
                        println!("Loaded {} tasks from {}.", project.tasks().len(), path);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
