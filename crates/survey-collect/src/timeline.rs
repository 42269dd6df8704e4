use crate::scenarios::{scenario_catalog, QuestionType, Scenario};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TimelineStep {
    Instructions {
        pages: usize,
    },
    Demographics,
    ScenarioPresentation {
        scenario_id: &'static str,
        title: &'static str,
    },
    Question {
        scenario_id: &'static str,
        question_type: QuestionType,
        question_index: u32,
        trial_type: &'static str,
    },
    Debrief,
}

pub const INSTRUCTION_PAGES: usize = 3;

pub fn build_timeline(seed: u64) -> Vec<TimelineStep> {
    let mut scenarios = scenario_catalog();
    let mut rng = StdRng::seed_from_u64(seed);
    scenarios.shuffle(&mut rng);

    let mut steps = vec![
        TimelineStep::Instructions {
            pages: INSTRUCTION_PAGES,
        },
        TimelineStep::Demographics,
    ];
    for scenario in &scenarios {
        steps.extend(scenario_steps(scenario));
    }
    steps.push(TimelineStep::Debrief);
    steps
}

fn scenario_steps(scenario: &Scenario) -> Vec<TimelineStep> {
    let mut steps = vec![TimelineStep::ScenarioPresentation {
        scenario_id: scenario.id,
        title: scenario.title,
    }];
    for (index, question) in scenario.questions.iter().enumerate() {
        steps.push(TimelineStep::Question {
            scenario_id: scenario.id,
            question_type: question.question_type,
            question_index: index as u32,
            trial_type: question.question_type.trial_type(),
        });
    }
    steps
}

pub fn scenario_order(steps: &[TimelineStep]) -> Vec<&'static str> {
    steps
        .iter()
        .filter_map(|s| match s {
            TimelineStep::ScenarioPresentation { scenario_id, .. } => Some(*scenario_id),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::REQUIRED_SCENARIO_IDS;

    #[test]
    fn same_seed_same_plan() {
        assert_eq!(build_timeline(1337), build_timeline(1337));
    }

    #[test]
    fn plan_brackets_scenarios_with_intro_and_debrief() {
        let steps = build_timeline(7);
        // instructions + demographics + 4 * (presentation + 3 questions) + debrief
        assert_eq!(steps.len(), 2 + 4 * 4 + 1);
        assert!(matches!(steps[0], TimelineStep::Instructions { pages: 3 }));
        assert_eq!(steps[1], TimelineStep::Demographics);
        assert_eq!(steps.last(), Some(&TimelineStep::Debrief));

        let mut order = scenario_order(&steps);
        order.sort_unstable();
        let mut expected = REQUIRED_SCENARIO_IDS.to_vec();
        expected.sort_unstable();
        assert_eq!(order, expected);
    }

    #[test]
    fn questions_follow_their_presentation() {
        let steps = build_timeline(99);
        for (i, step) in steps.iter().enumerate() {
            if let TimelineStep::ScenarioPresentation { scenario_id, .. } = step {
                for offset in 0..3u32 {
                    match &steps[i + 1 + offset as usize] {
                        TimelineStep::Question {
                            scenario_id: q_scenario,
                            question_index,
                            ..
                        } => {
                            assert_eq!(q_scenario, scenario_id);
                            assert_eq!(*question_index, offset);
                        }
                        other => panic!("expected question after {}, got {:?}", scenario_id, other),
                    }
                }
            }
        }
    }

    #[test]
    fn some_seed_changes_the_order() {
        let baseline = scenario_order(&build_timeline(0));
        let differs = (1..50u64).any(|seed| scenario_order(&build_timeline(seed)) != baseline);
        assert!(differs);
    }
}
