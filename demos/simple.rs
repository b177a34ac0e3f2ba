use maia2_eval::{Maia, MaiaConfig};
use std::fs;
use std::io::copy;
use std::path::Path;

const MODEL_URL: &str = "https://github.com/CSSLab/maia-platform-frontend/raw/c2afee/public/maia2/maia_rapid.onnx";
const MODEL_PATH: &str = "maia_rapid.onnx";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 1. Check and Download Model
    if !Path::new(MODEL_PATH).exists() {
        println!("Model not found at '{}'.", MODEL_PATH);
        println!("Downloading from {} ...", MODEL_URL);
        download_model(MODEL_URL, MODEL_PATH)?;
        println!("Download complete.");
    } else {
        println!("Found model at '{}'.", MODEL_PATH);
    }

    // 2. Initialize Maia
    // Note: The very first run might be slow as the runtime optimizes the graph
    println!("Initializing Maia session...");
    let mut maia = Maia::from_config(&MaiaConfig::new(MODEL_PATH))?;

    // 3. Run Evaluation: 1. e4 e5, White to move, and 1. e4, Black to move
    let fens = [
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
    ];
    println!("Evaluating {} positions for 1500 vs 1500...", fens.len());
    let results = maia.batch_evaluate_fens(&fens, &[1500, 1500], &[1500, 1500])?;

    // 4. Output Results
    for (fen, result) in fens.iter().zip(&results) {
        println!("------------------------------------------------");
        println!("{fen}");
        println!("Win Probability (Side to move): {:.2}%", result.value * 100.0);
        println!("Top 5 Predicted Moves:");

        for (i, move_prob) in result.policy.iter().take(5).enumerate() {
            println!(
                "{}. {}  (Prob: {:.2}%)",
                i + 1,
                move_prob.uci,
                move_prob.probability * 100.0
            );
        }
    }

    Ok(())
}

/// Helper to download file using reqwest (blocking)
fn download_model(url: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut response = reqwest::blocking::get(url)?;

    if !response.status().is_success() {
        return Err(format!("Failed to download: {}", response.status()).into());
    }

    let mut dest = fs::File::create(path)?;
    copy(&mut response, &mut dest)?;
    Ok(())
}
