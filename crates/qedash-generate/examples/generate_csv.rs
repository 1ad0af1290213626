use std::env;
use std::path::PathBuf;

use qedash_generate::{GenerateOptions, GenerationEngine};
use qedash_plan::{Plan, load_plan};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut plan_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--plan" => plan_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let plan = match plan_path {
        Some(path) => load_plan(&path)?.plan,
        None => Plan::default(),
    };

    let mut options = GenerateOptions::default();
    if let Some(out_dir) = out_dir {
        options.out_dir = out_dir;
    }

    let engine = GenerationEngine::new(options);
    let result = engine.run(&plan)?;

    println!("run_dir={}", result.run_dir.display());
    if let Some(fingerprint) = result.report.fingerprint {
        println!("fingerprint={fingerprint}");
    }
    Ok(())
}
