//! Quick evolution performance test
//!
//! Run with `RUST_LOG=info cargo run --release --example evolution_perf`.

use std::error::Error;
use std::time::Instant;

use voxel_fractal::{
    EvaluationContext, EvolutionConfig, EvolutionEngine, SubstitutionRule, VoxelGrid, expand,
    schema::{ColorPalette, EMPTY_RGB, FULL_RGB, PopulationConfig},
};

/// Menger sponge target: lit cubes keep their 20 edge and corner sub-cubes.
fn menger_target(depth: u32) -> Result<VoxelGrid, Box<dyn Error>> {
    let palette = ColorPalette::binary();
    let mut genes = vec![EMPTY_RGB; 27];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                let centers = [i, j, k].iter().filter(|&&c| c == 1).count();
                genes.push(if centers >= 2 { EMPTY_RGB } else { FULL_RGB });
            }
        }
    }
    let rule = SubstitutionRule::new(genes, &palette)?;
    let lit = VoxelGrid::for_depth(depth, FULL_RGB)?;
    Ok(expand(&rule, &palette, &lit, depth)?)
}

fn config(size: usize, max_generations: usize) -> EvolutionConfig {
    EvolutionConfig {
        population: PopulationConfig {
            size,
            max_generations: Some(max_generations),
            time_budget_secs: None,
            ..Default::default()
        },
        random_seed: Some(42),
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("=== Evolution Performance Test ===\n");

    // Test different depths
    for depth in [1u32, 2, 3] {
        let target = menger_target(depth)?;
        println!("Depth {}: {}^3 voxels", depth, target.side());

        let context = EvaluationContext::new(
            ColorPalette::binary(),
            VoxelGrid::for_depth(depth, FULL_RGB)?,
            target,
            depth,
        )?;

        let start = Instant::now();
        let mut engine = EvolutionEngine::new(&context, config(37, 50))?;
        let result = engine.run()?;
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best distance:  {:.1}", context.distance(&result.best.genome)?);
        println!("  Stop reason:    {:?}", result.stats.stop_reason);
        println!();
    }

    println!("=== Scalability Test (fixed depth 3) ===\n");

    let context = EvaluationContext::new(
        ColorPalette::binary(),
        VoxelGrid::for_depth(3, FULL_RGB)?,
        menger_target(3)?,
        3,
    )?;

    // Test different population sizes, sequential vs rayon
    for pop_size in [10, 20, 40, 80] {
        for parallel in [false, true] {
            let mut cfg = config(pop_size, 5);
            cfg.parallel = parallel;

            let start = Instant::now();
            let mut engine = EvolutionEngine::new(&context, cfg)?;
            let result = engine.run()?;
            let elapsed = start.elapsed();

            let total_evals = result.stats.total_evaluations;
            let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

            println!(
                "Population {} ({}): {} evals in {:.2}s ({:.1} evals/sec)",
                pop_size,
                if parallel { "parallel" } else { "sequential" },
                total_evals,
                elapsed.as_secs_f64(),
                evals_per_sec
            );
        }
    }

    Ok(())
}
