//! Integration tests for automation rule and execution repositories.

use serde_json::json;
use sqlx::PgPool;

use flowdesk_db::models::automation_execution::{
    CreateAutomationExecution, STATUS_FAILED, STATUS_SUCCESS,
};
use flowdesk_db::models::automation_rule::{CreateAutomationRule, UpdateAutomationRule};
use flowdesk_db::models::process::CreateProcess;
use flowdesk_db::repositories::{AutomationExecutionRepo, AutomationRuleRepo, ProcessRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_process(pool: &PgPool) -> i64 {
    ProcessRepo::create(
        pool,
        &CreateProcess {
            name: "Support".to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_rule(process_id: i64, name: &str, trigger_event: &str) -> CreateAutomationRule {
    CreateAutomationRule {
        name: name.to_string(),
        description: None,
        process_id,
        trigger_event: trigger_event.to_string(),
        trigger_stage_id: None,
        trigger_field_id: None,
        trigger_conditions: None,
        actions: json!([{"type": "send_notification", "message": "ping"}]),
        created_by: None,
    }
}

fn execution(rule_id: i64, status: &str) -> CreateAutomationExecution {
    CreateAutomationExecution {
        rule_id,
        ticket_id: None,
        status: status.to_string(),
        executed_by: None,
        execution_data: json!({"actions": []}),
    }
}

// ---------------------------------------------------------------------------
// Rule CRUD
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn create_applies_defaults(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let rule = AutomationRuleRepo::create(&pool, &new_rule(process_id, "r1", "overdue"))
        .await
        .unwrap();

    assert!(rule.is_active);
    assert_eq!(rule.trigger_conditions, json!([]));
    assert_eq!(rule.trigger_event, "overdue");
}

#[sqlx::test]
async fn list_active_for_event_filters(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let other_process = seed_process(&pool).await;

    let matching = AutomationRuleRepo::create(&pool, &new_rule(process_id, "m", "overdue"))
        .await
        .unwrap();
    // Different event type.
    AutomationRuleRepo::create(&pool, &new_rule(process_id, "other-event", "stage_changed"))
        .await
        .unwrap();
    // Different process.
    AutomationRuleRepo::create(&pool, &new_rule(other_process, "other-process", "overdue"))
        .await
        .unwrap();
    // Deactivated.
    let disabled = AutomationRuleRepo::create(&pool, &new_rule(process_id, "off", "overdue"))
        .await
        .unwrap();
    AutomationRuleRepo::update(
        &pool,
        disabled.id,
        &UpdateAutomationRule {
            name: None,
            description: None,
            trigger_event: None,
            trigger_stage_id: None,
            trigger_field_id: None,
            trigger_conditions: None,
            actions: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();

    let rules = AutomationRuleRepo::list_active_for_event(&pool, process_id, "overdue")
        .await
        .unwrap();

    let ids: Vec<_> = rules.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![matching.id]);
}

#[sqlx::test]
async fn delete_cascades_to_executions(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let rule = AutomationRuleRepo::create(&pool, &new_rule(process_id, "r1", "overdue"))
        .await
        .unwrap();
    AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_SUCCESS))
        .await
        .unwrap();

    assert!(AutomationRuleRepo::delete(&pool, rule.id).await.unwrap());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM automation_executions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

// ---------------------------------------------------------------------------
// Execution log
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn executions_list_newest_first(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let rule = AutomationRuleRepo::create(&pool, &new_rule(process_id, "r1", "overdue"))
        .await
        .unwrap();

    let first = AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_SUCCESS))
        .await
        .unwrap();
    let second = AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_FAILED))
        .await
        .unwrap();

    let list = AutomationExecutionRepo::list_for_rule(&pool, rule.id, 10)
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    // Newest first; ties broken by insert order in practice.
    assert!(list.iter().any(|e| e.id == first.id));
    assert_eq!(list.iter().filter(|e| e.id == second.id).count(), 1);
}

#[sqlx::test]
async fn stats_round_success_rate_to_two_decimals(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let rule = AutomationRuleRepo::create(&pool, &new_rule(process_id, "r1", "overdue"))
        .await
        .unwrap();

    AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_SUCCESS))
        .await
        .unwrap();
    AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_SUCCESS))
        .await
        .unwrap();
    AutomationExecutionRepo::create(&pool, &execution(rule.id, STATUS_FAILED))
        .await
        .unwrap();

    let stats = AutomationExecutionRepo::stats_for_rule(&pool, rule.id)
        .await
        .unwrap();

    assert_eq!(stats.execution_count, 3);
    assert_eq!(stats.success_rate, 66.67);
}

#[sqlx::test]
async fn stats_are_zero_without_executions(pool: PgPool) {
    let process_id = seed_process(&pool).await;
    let rule = AutomationRuleRepo::create(&pool, &new_rule(process_id, "r1", "overdue"))
        .await
        .unwrap();

    let stats = AutomationExecutionRepo::stats_for_rule(&pool, rule.id)
        .await
        .unwrap();

    assert_eq!(stats.execution_count, 0);
    assert_eq!(stats.success_rate, 0.0);
}
