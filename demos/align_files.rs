use pointalign_io::read_xyz;
use pointalign_registration::{align, RansacParams, SamplingMode};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (source_path, target_path) = match (args.next(), args.next()) {
        (Some(s), Some(t)) => (s, t),
        _ => {
            eprintln!("usage: align_files <source.xyz> <target.xyz> [threshold]");
            return ExitCode::FAILURE;
        }
    };
    let threshold: f32 = match args.next().map(|a| a.parse()) {
        None => 0.1,
        Some(Ok(v)) => v,
        Some(Err(_)) => {
            eprintln!("threshold must be a number");
            return ExitCode::FAILURE;
        }
    };

    let source = match read_xyz(&source_path) {
        Ok(cloud) => cloud,
        Err(err) => {
            eprintln!("failed to read {}: {}", source_path, err);
            return ExitCode::FAILURE;
        }
    };
    let target = match read_xyz(&target_path) {
        Ok(cloud) => cloud,
        Err(err) => {
            eprintln!("failed to read {}: {}", target_path, err);
            return ExitCode::FAILURE;
        }
    };

    println!("Source: {} points from {}", source.len(), source_path);
    println!("Target: {} points from {}", target.len(), target_path);

    let params = RansacParams {
        inlier_threshold: threshold,
        sampling: SamplingMode::Paired,
        ..RansacParams::default()
    };
    let result = match align(&source, &target, &params) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("alignment failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Best transformation: {} inliers, fitness {:.2}",
        result.inlier_count, result.fitness
    );
    for row in result.transform.to_matrix4() {
        println!(
            "| {:.4}, {:.4}, {:.4}, {:.4} |",
            row[0], row[1], row[2], row[3]
        );
    }

    ExitCode::SUCCESS
}
