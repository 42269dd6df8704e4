use serde::{Deserialize, Serialize};

pub const TROLLEY_UNCERTAINTY: &str = "trolley_uncertainty";
pub const CAUSAL_UNCERTAINTY: &str = "causal_uncertainty";
pub const INTENT_INFERENCE: &str = "intent_inference";
pub const OUTCOME_PROBABILITY: &str = "outcome_probability";

pub const REQUIRED_SCENARIO_IDS: [&str; 4] = [
    TROLLEY_UNCERTAINTY,
    CAUSAL_UNCERTAINTY,
    INTENT_INFERENCE,
    OUTCOME_PROBABILITY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MoralJudgment,
    ProbabilityJudgment,
    Confidence,
    CausalJudgment,
    IntentJudgment,
    OutcomeDependence,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MoralJudgment => "moral_judgment",
            QuestionType::ProbabilityJudgment => "probability_judgment",
            QuestionType::Confidence => "confidence",
            QuestionType::CausalJudgment => "causal_judgment",
            QuestionType::IntentJudgment => "intent_judgment",
            QuestionType::OutcomeDependence => "outcome_dependence",
        }
    }

    pub fn trial_type(&self) -> &'static str {
        match self {
            QuestionType::MoralJudgment
            | QuestionType::Confidence
            | QuestionType::CausalJudgment
            | QuestionType::OutcomeDependence => "survey-likert",
            QuestionType::ProbabilityJudgment => "survey-html-form",
            QuestionType::IntentJudgment => "survey-multi-choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ResponseInput {
    Likert { labels: &'static [&'static str] },
    Slider { min: u32, max: u32, step: u32 },
    MultiChoice { options: &'static [&'static str] },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub question_type: QuestionType,
    pub prompt: &'static str,
    #[serde(flatten)]
    pub input: ResponseInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub questions: Vec<Question>,
}

const ACCEPTABILITY: &[&str] = &[
    "Completamente inaceptable",
    "Muy inaceptable",
    "Algo inaceptable",
    "Neutral",
    "Algo aceptable",
    "Muy aceptable",
    "Completamente aceptable",
];

const PERCENT: ResponseInput = ResponseInput::Slider {
    min: 0,
    max: 100,
    step: 1,
};

pub fn scenario_catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            id: TROLLEY_UNCERTAINTY,
            title: "El Problema del Tranvía con Incertidumbre",
            text: "Juan ve un tranvía fuera de control dirigiéndose hacia cinco personas en las vías. \
Puede tirar de una palanca que desvíe el tranvía a una vía lateral donde hay una persona. \
Sin embargo, Juan no está completamente seguro de cuántas personas hay en cada vía:\n\n\
• Vía principal: Probablemente 5 personas (90% seguro)\n\
• Vía lateral: Probablemente 1 persona (70% seguro)\n\n\
Juan tiene que decidir rápidamente si tirar de la palanca.",
            questions: vec![
                Question {
                    question_type: QuestionType::MoralJudgment,
                    prompt: "¿Qué tan moralmente aceptable es que Juan tire de la palanca?",
                    input: ResponseInput::Likert {
                        labels: ACCEPTABILITY,
                    },
                },
                Question {
                    question_type: QuestionType::ProbabilityJudgment,
                    prompt: "¿Cuál es la probabilidad de que la acción de Juan sea moralmente correcta?",
                    input: PERCENT,
                },
                Question {
                    question_type: QuestionType::Confidence,
                    prompt: "¿Qué tan confiado estás en tu juicio moral?",
                    input: ResponseInput::Likert {
                        labels: &[
                            "Nada confiado",
                            "Poco confiado",
                            "Algo confiado",
                            "Bastante confiado",
                            "Muy confiado",
                        ],
                    },
                },
            ],
        },
        Scenario {
            id: CAUSAL_UNCERTAINTY,
            title: "Responsabilidad Causal Incierta",
            text: "María es doctora en un hospital. Un paciente llega en estado crítico y necesita un \
medicamento específico inmediatamente. María tiene dos opciones:\n\n\
• Medicamento A: 80% de probabilidad de curar al paciente, 5% de efectos secundarios graves\n\
• Medicamento B: 60% de probabilidad de curar al paciente, 1% de efectos secundarios graves\n\n\
María elige el Medicamento A. Desafortunadamente, el paciente desarrolla efectos secundarios graves. \
Más tarde se descubre que había un factor genético raro (presente en 2% de la población) \
que María no conocía y que aumentaba el riesgo de efectos secundarios.",
            questions: vec![
                Question {
                    question_type: QuestionType::MoralJudgment,
                    prompt: "¿Qué tan moralmente responsable es María por los efectos secundarios?",
                    input: ResponseInput::Likert {
                        labels: &[
                            "No responsable",
                            "Ligeramente responsable",
                            "Algo responsable",
                            "Moderadamente responsable",
                            "Muy responsable",
                            "Completamente responsable",
                        ],
                    },
                },
                Question {
                    question_type: QuestionType::ProbabilityJudgment,
                    prompt: "¿Cuál es la probabilidad de que María haya actuado éticamente?",
                    input: PERCENT,
                },
                Question {
                    question_type: QuestionType::CausalJudgment,
                    prompt: "¿En qué medida fue María la causa de los efectos secundarios?",
                    input: ResponseInput::Likert {
                        labels: &[
                            "No fue causa",
                            "Causa mínima",
                            "Causa menor",
                            "Causa moderada",
                            "Causa mayor",
                            "Causa principal",
                            "Única causa",
                        ],
                    },
                },
            ],
        },
        Scenario {
            id: INTENT_INFERENCE,
            title: "Inferencia de Intención",
            text: "Carlos trabaja en una empresa de tecnología. Descubre que el software que está desarrollando \
podría usarse para vigilancia masiva si cae en manos equivocadas. Carlos tiene información limitada:\n\n\
• 30% de probabilidad de que la empresa venda el software a gobiernos autoritarios\n\
• 70% de probabilidad de que se use solo para seguridad legítima\n\
• Carlos podría filtrar información para alertar al público, arriesgando su trabajo\n\
• Si no actúa y el software se usa mal, miles podrían verse afectados\n\n\
Carlos decide no filtrar la información y continuar con el proyecto.",
            questions: vec![
                Question {
                    question_type: QuestionType::MoralJudgment,
                    prompt: "¿Qué tan moralmente aceptable es la decisión de Carlos?",
                    input: ResponseInput::Likert {
                        labels: ACCEPTABILITY,
                    },
                },
                Question {
                    question_type: QuestionType::IntentJudgment,
                    prompt: "¿Cuál crees que fue la principal intención de Carlos?",
                    input: ResponseInput::MultiChoice {
                        options: &[
                            "Proteger su trabajo",
                            "Evitar causar pánico innecesario",
                            "Confiar en su empresa",
                            "No querer responsabilizarse",
                            "Otra razón",
                        ],
                    },
                },
                Question {
                    question_type: QuestionType::ProbabilityJudgment,
                    prompt: "Si el software se usa para vigilancia masiva, ¿cuál es la probabilidad \
de que Carlos sea moralmente culpable?",
                    input: PERCENT,
                },
            ],
        },
        Scenario {
            id: OUTCOME_PROBABILITY,
            title: "Probabilidades de Resultados Morales",
            text: "Elena es directora de una ONG de ayuda humanitaria. Debe decidir cómo distribuir fondos limitados:\n\n\
Opción A: Programa de vacunación\n\
• 90% probabilidad de salvar 100 vidas\n\
• 10% probabilidad de fallo del programa (0 vidas salvadas)\n\n\
Opción B: Programa de agua potable\n\
• 100% probabilidad de salvar 80 vidas\n\
• Sin riesgo de fallo\n\n\
Elena elige la Opción A, pero el programa falla y no se salva ninguna vida.",
            questions: vec![
                Question {
                    question_type: QuestionType::MoralJudgment,
                    prompt: "¿Qué tan moralmente correcta fue la decisión original de Elena?",
                    input: ResponseInput::Likert {
                        labels: &[
                            "Muy incorrecta",
                            "Incorrecta",
                            "Algo incorrecta",
                            "Neutral",
                            "Algo correcta",
                            "Correcta",
                            "Muy correcta",
                        ],
                    },
                },
                Question {
                    question_type: QuestionType::ProbabilityJudgment,
                    prompt: "Antes de saber el resultado, ¿cuál era la probabilidad de que Elena \
tomara la decisión moralmente correcta?",
                    input: PERCENT,
                },
                Question {
                    question_type: QuestionType::OutcomeDependence,
                    prompt: "¿Cambia tu evaluación moral sabiendo que el programa falló?",
                    input: ResponseInput::Likert {
                        labels: &[
                            "Mucho peor",
                            "Algo peor",
                            "Ligeramente peor",
                            "No cambia",
                            "Ligeramente mejor",
                            "Algo mejor",
                            "Mucho mejor",
                        ],
                    },
                },
            ],
        },
    ]
}

pub fn find_scenario(id: &str) -> Option<Scenario> {
    scenario_catalog().into_iter().find(|s| s.id == id)
}
