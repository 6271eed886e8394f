//! Built-in example projects loaded on first start.

use crate::model::topic::{Topic, Unit};

const SEED: &[(&str, &str, &[(&str, u32)])] = &[
    (
        "Game Analytics Platform",
        "Game mechanics data analytics platform with multiple Kafka sources",
        &[
            ("Setting up Kafka consumers in Node.js", 5),
            ("Building real-time data pipelines", 10),
            ("React dashboard component architecture", 5),
            ("Data visualization with D3 integration", 15),
        ],
    ),
    (
        "Productivity RPG",
        "React Three Fiber project with event-sourced backend that gamifies productivity",
        &[
            ("R3F scene setup & character models", 10),
            ("Event sourcing architecture fundamentals", 15),
            ("RPG stat system & progression logic", 10),
            ("Task completion & reward mechanics", 5),
        ],
    ),
    (
        "Spaceship Portfolio",
        "Interactive personal website in React Three Fiber featuring a spaceship experience",
        &[
            ("Spaceship interior modeling", 15),
            ("First-person camera controls", 10),
            ("Portal effects & shader basics", 15),
            ("Interactive objects & highlighting", 5),
        ],
    ),
];

/// Returns fresh seed topics with newly minted ids.
pub fn seed_topics() -> Vec<Topic> {
    SEED.iter()
        .zip(1..)
        .map(|(&(name, description, units), ordinal)| {
            let mut topic = Topic::new(ordinal, name, Some(description.to_string()));
            topic.units = units
                .iter()
                .zip(1..)
                .map(|(&(unit_name, minutes), unit_ordinal)| {
                    Unit::new(unit_ordinal, unit_name, Some(minutes))
                })
                .collect();
            topic
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::seed_topics;

    #[test]
    fn seed_units_are_unstudied_and_valid() {
        let topics = seed_topics();
        assert_eq!(topics.len(), 3);
        for topic in &topics {
            assert_eq!(topic.units.len(), 4);
            for unit in &topic.units {
                unit.validate().expect("seed unit should be valid");
                assert!(!unit.completed);
            }
        }
        assert_eq!(topics[2].ordinal, 3);
        assert_eq!(topics[2].units[3].ordinal, 4);
    }
}
