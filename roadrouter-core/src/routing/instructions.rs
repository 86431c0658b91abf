use itertools::Itertools;

use super::dijkstra::ShortestPath;
use crate::model::{RoadGraph, RouteInstruction, initial_bearing};

const COMPASS: [&str; 8] = [
    "north",
    "northeast",
    "east",
    "southeast",
    "south",
    "southwest",
    "west",
    "northwest",
];

pub const ARRIVAL_INSTRUCTION: &str = "You have arrived at your destination";

/// Eight-point compass name for a bearing in degrees
pub fn bearing_to_direction(bearing: f64) -> &'static str {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sector = (bearing.rem_euclid(360.0) / 45.0).round() as usize % COMPASS.len();
    COMPASS[sector]
}

/// Turn-by-turn text for a path: one step per edge plus the arrival step
pub fn route_instructions(graph: &RoadGraph, path: &ShortestPath) -> Vec<RouteInstruction> {
    let mut instructions = Vec::with_capacity(path.edges.len() + 1);

    for (step, (edge, (&from, &to))) in path
        .edges
        .iter()
        .zip(path.nodes.iter().tuple_windows())
        .enumerate()
    {
        let from = &graph.node(from).coordinate;
        let to = &graph.node(to).coordinate;
        let edge = graph.edge(*edge);
        let direction = bearing_to_direction(initial_bearing(from, to));
        let verb = if step == 0 { "Head" } else { "Continue" };

        instructions.push(RouteInstruction {
            step: step + 1,
            instruction: format!("{verb} {direction} for {:.1} km", edge.distance()),
            distance: edge.distance(),
            duration: edge.travel_time(),
            coordinate: *from,
        });
    }

    if let Some(&last) = path.nodes.last() {
        instructions.push(RouteInstruction {
            step: instructions.len() + 1,
            instruction: ARRIVAL_INSTRUCTION.to_string(),
            distance: 0.0,
            duration: 0.0,
            coordinate: graph.node(last).coordinate,
        });
    }

    instructions
}
