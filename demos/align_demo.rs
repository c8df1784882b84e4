use pointalign_core::PointCloud;
use pointalign_registration::{
    align, apply_transform, RansacParams, SamplingMode, SimilarityTransform,
};

fn print_matrix(m: &[[f32; 4]; 4]) {
    for row in m {
        println!(
            "| {:.4}, {:.4}, {:.4}, {:.4} |",
            row[0], row[1], row[2], row[3]
        );
    }
}

fn main() {
    env_logger::init();

    // An L-shaped planar scene.
    let source = PointCloud::from_xyz(
        vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0],
        vec![0.0; 7],
    );
    println!("Source: {} points, centroid {:?}", source.len(), source.centroid());

    // Target is the source rotated 90 degrees about Z and shifted.
    let motion = SimilarityTransform {
        rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [2.0, 3.0, 0.0],
        scale: 1.0,
    };
    let target = apply_transform(&source, &motion);
    println!("Target: {} points, centroid {:?}", target.len(), target.centroid());

    let params = RansacParams {
        inlier_threshold: 0.01,
        sampling: SamplingMode::Paired,
        ..RansacParams::default()
    };
    let result = align(&source, &target, &params).expect("alignment failed");

    println!(
        "Best transformation ({} of {} inliers, fitness {:.2}):",
        result.inlier_count,
        source.len(),
        result.fitness
    );
    print_matrix(&result.transform.to_matrix4());

    println!("Aligned first point: {:?}", result.aligned.point(0));
    println!("Target first point:  {:?}", target.point(0));
}
