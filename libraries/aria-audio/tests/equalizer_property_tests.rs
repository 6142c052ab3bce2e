//! Property tests for the equalizer graph

use aria_audio::{EqualizerGraph, EqualizerSettings, MAX_GAIN_DB, MIN_GAIN_DB};
use proptest::prelude::*;

proptest! {
    #[test]
    fn gains_always_within_range(gains in prop::collection::vec(-100.0f32..100.0, 10)) {
        let mut graph = EqualizerGraph::new();
        graph.set_gains(&gains).unwrap();

        for gain in graph.gains() {
            prop_assert!((MIN_GAIN_DB..=MAX_GAIN_DB).contains(&gain));
        }
    }

    #[test]
    fn filtered_output_stays_finite(
        gains in prop::collection::vec(-12.0f32..12.0, 10),
        input in prop::collection::vec(-1.0f32..1.0, 2..512),
    ) {
        let settings = EqualizerSettings::from_gains(&gains).unwrap();
        let mut graph = EqualizerGraph::with_settings(settings);
        let mut stage = graph.rebuild();

        let mut buffer = input;
        stage.process(&mut buffer, 44_100);
        prop_assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn only_latest_rebuild_attaches(rebuilds in 2usize..8, pick in 0usize..7) {
        let mut graph = EqualizerGraph::new();
        let mut tickets: Vec<_> = (0..rebuilds).map(|_| graph.begin_rebuild()).collect();
        let pick = pick % rebuilds;
        let ticket = tickets.swap_remove(pick);
        let is_latest = ticket.generation() == rebuilds as u64;

        prop_assert_eq!(graph.attach(ticket.build()).is_ok(), is_latest);
    }
}
