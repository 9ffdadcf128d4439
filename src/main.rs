//! # Pageplan CLI
//!
//! Usage:
//!   pageplan request.json -o outcome.json
//!   echo '{ ... }' | pageplan
//!   pageplan --example > request.json

use std::env;
use std::fs;
use std::io::{self, Read};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_request_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).expect("Failed to read input file")
    } else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .expect("Failed to read stdin");
        buf
    };

    let output_path = args.windows(2).find(|w| w[0] == "-o").map(|w| w[1].clone());

    match pageplan::plan_json(&input) {
        Ok(outcome_json) => {
            let outcome: pageplan::solver::SolverOutcome =
                serde_json::from_str(&outcome_json).expect("outcome round-trips");
            match output_path {
                Some(path) => {
                    fs::write(&path, &outcome_json).expect("Failed to write outcome");
                    eprintln!("✓ {} → {}", pageplan::report::summarize(&outcome), path);
                }
                None => {
                    println!("{}", outcome_json);
                    eprintln!("✓ {}", pageplan::report::summarize(&outcome));
                }
            }
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_request_json() -> &'static str {
    r#"{
  "page": { "columns": 5, "column_height_mm": 310.0 },
  "notes": [
    { "id": "p7#1", "chars_title": 42, "chars_body": 2400, "image_count": 1 },
    { "id": "p7#2", "chars_title": 38, "chars_body": 1600, "image_count": 1, "image_mode": "vertical" },
    { "id": "p7#3", "chars_title": 51, "chars_body": 900, "image_count": 0, "title_level": 2 },
    { "id": "p7#4", "chars_title": 24, "chars_body": 3100, "image_count": 2 }
  ],
  "typography": {
    "chars_per_line": 32,
    "lines_per_mm": 0.38,
    "title_heights_mm": { "1": 16.0, "2": 12.0, "3": 8.0 }
  },
  "image_presets": {
    "horizontal": { "name": "horizontal", "span": 2, "height_mm": 43.0 },
    "vertical": { "name": "vertical", "span": 1, "height_mm": 60.0 }
  },
  "settings": {
    "beam_width": 8,
    "fit_bonus": 8.0,
    "overflow_penalty_per_char": 0.12,
    "drop_penalty": 10.0
  }
}
"#
}
