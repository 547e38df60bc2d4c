use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only variables that never hold secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "SOUQ_HOST",
        "SOUQ_PORT",
        "SOUQ_DATABASE_URL",
        "SOUQ_DB_MAX_CONNECTIONS",
        "SOUQ_AUTO_MIGRATE",
        "SOUQ_RECALC_INTERVAL_HOURS",
        "SOUQ_PAYMOB_HMAC_CHECKS",
        "SOUQ_PAYMOB_BASE_URL",
        "SOUQ_PAYMOB_INTEGRATION_ID",
        "SOUQ_PAYMOB_CURRENCY",
        "SOUQ_PAYMOB_TIMEOUT_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
