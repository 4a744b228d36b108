// Derivative-free minimizer (Nelder-Mead simplex) for n-dimensional functions.
// Deterministic: the same objective and starting point always give the same optimum.

#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub max_iterations: usize,
    // Converged once every vertex is within `x_tolerance` of the best vertex
    // and the objective spread is within `f_tolerance`
    pub x_tolerance: f64,
    pub f_tolerance: f64,
    // Relative size of the initial simplex around the starting point
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        SimplexOptions {
            max_iterations: 20_000,
            x_tolerance: 1e-6,
            f_tolerance: 1e-9,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Optimum<const N: usize> {
    pub position: [f64; N],
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

// Objectives may return f64::INFINITY (or NaN, which is treated as infinity)
// to mark a point as infeasible; the simplex then moves away from it.
pub fn minimize<const N: usize>(
    initial: [f64; N],
    objective: impl Fn(&[f64; N]) -> f64,
    options: &SimplexOptions,
) -> Optimum<N> {
    const REFLECTION: f64 = 1.0;
    const EXPANSION: f64 = 2.0;
    const CONTRACTION: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let evaluate = |x: &[f64; N]| {
        let value = objective(x);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    };

    // Initial simplex: the starting point plus one vertex stepped along each axis
    let mut vertices: Vec<[f64; N]> = Vec::with_capacity(N + 1);
    vertices.push(initial);
    for i in 0..N {
        let mut vertex = initial;
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + options.initial_step)
        } else {
            0.00025
        };
        vertices.push(vertex);
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| evaluate(v)).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        // Order vertices from best to worst
        let mut order: Vec<usize> = (0..=N).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        vertices = order.iter().map(|&i| vertices[i]).collect();
        values = order.iter().map(|&i| values[i]).collect();

        if has_converged(&vertices, &values, options) {
            converged = true;
            break;
        }
        iterations += 1;

        // Centroid of every vertex except the worst
        let mut centroid = [0.0; N];
        for vertex in &vertices[..N] {
            for j in 0..N {
                centroid[j] += vertex[j] / N as f64;
            }
        }

        let worst = vertices[N];
        let toward = |coefficient: f64| {
            let mut point = [0.0; N];
            for j in 0..N {
                point[j] = centroid[j] + coefficient * (worst[j] - centroid[j]);
            }
            point
        };

        let reflected = toward(-REFLECTION);
        let reflected_value = evaluate(&reflected);

        if reflected_value < values[0] {
            // Best so far, try going further in the same direction
            let expanded = toward(-EXPANSION);
            let expanded_value = evaluate(&expanded);
            if expanded_value < reflected_value {
                vertices[N] = expanded;
                values[N] = expanded_value;
            } else {
                vertices[N] = reflected;
                values[N] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[N - 1] {
            vertices[N] = reflected;
            values[N] = reflected_value;
            continue;
        }

        // Contract: outside if the reflection beat the worst vertex, inside otherwise
        let (contracted, accept_below) = if reflected_value < values[N] {
            (toward(-CONTRACTION), reflected_value)
        } else {
            (toward(CONTRACTION), values[N])
        };
        let contracted_value = evaluate(&contracted);
        if contracted_value < accept_below {
            vertices[N] = contracted;
            values[N] = contracted_value;
            continue;
        }

        // Nothing worked, shrink every vertex toward the best one
        let best = vertices[0];
        for i in 1..=N {
            for j in 0..N {
                vertices[i][j] = best[j] + SHRINK * (vertices[i][j] - best[j]);
            }
            values[i] = evaluate(&vertices[i]);
        }
    }

    let best = (0..=N)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Optimum {
        position: vertices[best],
        value: values[best],
        iterations,
        converged: converged && values[best].is_finite(),
    }
}

fn has_converged<const N: usize>(
    vertices: &[[f64; N]],
    values: &[f64],
    options: &SimplexOptions,
) -> bool {
    let best = &vertices[0];
    let x_spread = vertices[1..]
        .iter()
        .flat_map(|vertex| vertex.iter().zip(best.iter()).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max);
    let f_spread = values[1..]
        .iter()
        .map(|v| (v - values[0]).abs())
        .fold(0.0, f64::max);

    x_spread <= options.x_tolerance && f_spread <= options.f_tolerance
}
