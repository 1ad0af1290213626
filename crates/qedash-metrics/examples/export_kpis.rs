use std::env;
use std::path::PathBuf;

use qedash_metrics::{MetricsEngine, MetricsOptions};
use qedash_store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut db_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            _ => {
                if db_path.is_none() {
                    db_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let db_path = db_path.ok_or("missing --db path")?;
    let mut options = MetricsOptions::default();
    if let Some(out_dir) = out_dir {
        options.out_dir = out_dir;
    }

    let store = SqliteStore::open(&db_path).await?;
    let result = MetricsEngine::new(options).run(&store).await?;
    store.close().await;

    for file in &result.files {
        println!("wrote={}", file.display());
    }
    println!("at_risk_modules={}", result.summary.at_risk_modules);
    Ok(())
}
