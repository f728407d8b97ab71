use route_advisor::workflows::reroute::EvaluationOutcome;

use crate::infra::{InMemoryRecommendationStore, LoggingAuditSink};

pub(crate) fn render_outcome(shipment_ref: &str, outcome: Option<&EvaluationOutcome>) {
    println!("\nShipment {shipment_ref}");
    let Some(outcome) = outcome else {
        println!("- No reroute warranted; current route stays in place");
        return;
    };

    let decision = &outcome.decision;
    let recommendation = &outcome.recommendation;
    println!(
        "- Current route {}: composite {:.3} | combined risk {:.2}",
        decision.current.display_name(),
        decision.current.composite_score,
        decision.current.risk.combined
    );
    println!(
        "- Recommended {}: composite {:.3} ({:+.3}) | combined risk {:.2}",
        decision.recommended.display_name(),
        decision.recommended.composite_score,
        decision.score_delta,
        decision.recommended.risk.combined
    );
    if decision.recommended.risk.is_degraded() {
        let domains: Vec<&str> = decision
            .recommended
            .risk
            .degraded
            .iter()
            .map(|domain| domain.label())
            .collect();
        println!("  Degraded risk domains: {}", domains.join(", "));
    }
    println!(
        "- Deltas: cost {:+.0} USD | time {:+.1}h | emissions {:+.0} kg | risk reduction {:+.2}",
        decision.cost_delta_usd,
        decision.time_delta_hours,
        decision.emissions_delta_kg,
        decision.risk_reduction
    );
    println!(
        "- {} {} -> severity {} | {} of {} alternatives qualified",
        recommendation.id,
        recommendation.status.label(),
        recommendation.severity.label(),
        decision.candidates_qualifying,
        decision.candidates_considered
    );

    match &outcome.approval_request {
        Some(request) => println!(
            "- Approval required ({}): {} sign-off under {}",
            request.reason, request.required_role, request.policy_triggered
        ),
        None => println!("- Auto-apply: {}", outcome.gate.reason),
    }

    let rationale = &recommendation.rationale;
    match rationale.fallback_reason {
        Some(reason) => println!(
            "  Rationale [{} ({}), confidence {:.2}]",
            rationale.model,
            reason.label(),
            rationale.confidence
        ),
        None => println!(
            "  Rationale [{}, confidence {:.2}]",
            rationale.model, rationale.confidence
        ),
    }
    println!("  {}", rationale.text);
    for factor in &rationale.factors {
        println!("    - {factor}");
    }
}

pub(crate) fn render_summary(store: &InMemoryRecommendationStore, audit: &LoggingAuditSink) {
    let audits = audit.records();
    let fallbacks = audits.iter().filter(|record| record.is_fallback).count();
    println!(
        "\nRun summary: {} recommendations | {} approval requests | {} of {} rationales from the deterministic template",
        store.recommendation_count(),
        store.approvals().len(),
        fallbacks,
        audits.len()
    );
}
