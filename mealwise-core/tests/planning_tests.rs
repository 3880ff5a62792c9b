//! End-to-end tests for plan orchestration.
//!
//! Each test drives a `PlanOrchestrator` over the in-memory store with a
//! scripted fake provider, so no network or database is involved.

use chrono::{Duration, Utc};
use mealwise_core::{
    FakeProvider, MemoryStore, Owner, Plan, PlanOrchestrator, PlanOutcome, PlanRequest,
    PlanStatus, PlanStore, PlannerConfig, PlanningError, RecipeGateway,
};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

const FENCED_X: &str = "```json\n[{\"title\":\"X\",\"ingredients\":[{\"name\":\"Egg\"}],\"steps\":[{\"order\":1,\"text\":\"Boil\"}]}]\n```";
const PLAIN_Y: &str =
    r#"[{"title":"Y","ingredients":[{"name":"Rice"}],"steps":[{"order":1,"text":"Steam"}]},{"title":"Z","ingredients":[],"steps":[{"order":1,"text":"Plate"}]}]"#;

struct Harness {
    store: Arc<MemoryStore>,
    provider: Arc<FakeProvider>,
    orchestrator: PlanOrchestrator,
    owner: Owner,
}

fn owner(name: &str) -> Owner {
    Owner {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

async fn stock(store: &MemoryStore, owner: &Owner) {
    store
        .add_ingredient(owner.id, "Egg", Some(Utc::now() + Duration::days(7)))
        .await;
    store.add_kitchenware(owner.id, "Saucepan").await;
}

async fn harness(provider: FakeProvider) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(provider);
    let orchestrator = PlanOrchestrator::new(
        store.clone(),
        store.clone(),
        RecipeGateway::new(provider.clone()),
        PlannerConfig::default(),
    );
    let owner = owner("Ada");
    stock(&store, &owner).await;

    Harness {
        store,
        provider,
        orchestrator,
        owner,
    }
}

fn request(prompt: Option<&str>) -> PlanRequest {
    PlanRequest {
        title: "Weeknight dinner".to_string(),
        tags: vec!["easy".to_string()],
        prompt: prompt.map(str::to_string),
        meal_type: "Dinner".to_string(),
        party_size: 2,
        time_budget_minutes: 30,
    }
}

async fn submit(h: &Harness, owner: &Owner, prompt: Option<&str>) -> Plan {
    match h.orchestrator.submit(owner, request(prompt)).await.unwrap() {
        PlanOutcome::Scheduled(plan) => plan,
        PlanOutcome::NotReady(n) => panic!("unexpected not ready: {}", n.message),
    }
}

/// Wait for the plan's generation loop and return the stored plan.
async fn settle(h: &Harness, plan_id: Uuid) -> Plan {
    h.orchestrator.wait_for_generation(plan_id).await;
    h.store.get_plan(plan_id).await.unwrap().unwrap()
}

fn bad_responses(n: usize) -> FakeProvider {
    FakeProvider::with_script((0..n).map(|_| Ok("I cannot do that".to_string())).collect())
}

#[tokio::test]
async fn test_submit_creates_waiting_plan_and_records_prompt() {
    let h = harness(FakeProvider::default()).await;

    let plan = submit(&h, &h.owner, Some("quick pasta")).await;
    assert_eq!(plan.status, PlanStatus::Waiting);
    assert_eq!(plan.owner_id, h.owner.id);

    let prompts = h.orchestrator.list_prompts(&h.owner).await.unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].text, "quick pasta");
    assert_eq!(prompts[0].frequency, 1);

    settle(&h, plan.id).await;
}

#[tokio::test]
async fn test_reused_prompt_increments_frequency() {
    let h = harness(FakeProvider::default()).await;

    let first = submit(&h, &h.owner, Some("quick pasta")).await;
    let second = submit(&h, &h.owner, Some("quick pasta")).await;
    let third = submit(&h, &h.owner, Some("soup")).await;
    for id in [first.id, second.id, third.id] {
        settle(&h, id).await;
    }

    let prompts = h.orchestrator.list_prompts(&h.owner).await.unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].text, "quick pasta");
    assert_eq!(prompts[0].frequency, 2);
    assert_eq!(prompts[1].text, "soup");
    assert_eq!(prompts[1].frequency, 1);
}

#[tokio::test]
async fn test_plan_without_prompt_records_nothing() {
    let h = harness(FakeProvider::default()).await;
    let plan = submit(&h, &h.owner, Some("   ")).await;
    assert_eq!(plan.prompt, None);
    assert!(h.orchestrator.list_prompts(&h.owner).await.unwrap().is_empty());
    settle(&h, plan.id).await;
}

#[tokio::test]
async fn test_fenced_response_succeeds_first_try() {
    let h = harness(FakeProvider::with_script(vec![Ok(FENCED_X.to_string())])).await;

    let plan = submit(&h, &h.owner, Some("quick pasta")).await;
    let plan = settle(&h, plan.id).await;

    assert_eq!(plan.status, PlanStatus::Success);
    assert_eq!(h.provider.call_count(), 1);

    let logs = h.store.generation_logs(plan.id).await;
    assert_eq!(logs.len(), 1);
    assert!(logs[0].is_success());
    assert_eq!(logs[0].llm_response, FENCED_X);
    assert_eq!(logs[0].task_name, "create_plan");

    let detail = h
        .orchestrator
        .get_plan_detail(&h.owner, plan.id)
        .await
        .unwrap();
    assert_eq!(detail.recipes.len(), 1);
    assert_eq!(detail.recipes[0].title, "X");
    assert_eq!(detail.recipes[0].owner_id, h.owner.id);
    assert_eq!(detail.recipes[0].plan_id, plan.id);
}

#[tokio::test]
async fn test_unparseable_responses_exhaust_attempts() {
    let h = harness(bad_responses(5)).await;

    let plan = submit(&h, &h.owner, None).await;
    let plan = settle(&h, plan.id).await;

    assert_eq!(plan.status, PlanStatus::Fail);
    assert_eq!(h.provider.call_count(), 3);

    let logs = h.store.generation_logs(plan.id).await;
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| !l.is_success()));
    assert!(h.store.all_recipes().await.is_empty());
}

#[tokio::test]
async fn test_attempt_count_is_configurable() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(bad_responses(5));
    let orchestrator = PlanOrchestrator::new(
        store.clone(),
        store.clone(),
        RecipeGateway::new(provider.clone()),
        PlannerConfig {
            max_attempts: 5,
            ..PlannerConfig::default()
        },
    );
    let ada = owner("Ada");
    stock(&store, &ada).await;

    let PlanOutcome::Scheduled(plan) = orchestrator.submit(&ada, request(None)).await.unwrap()
    else {
        panic!("expected a plan");
    };
    orchestrator.wait_for_generation(plan.id).await;

    assert_eq!(provider.call_count(), 5);
    assert_eq!(store.generation_logs(plan.id).await.len(), 5);
}

#[tokio::test]
async fn test_empty_inventory_creates_no_plan() {
    let h = harness(FakeProvider::default()).await;
    let newcomer = owner("Grace");

    let outcome = h.orchestrator.submit(&newcomer, request(Some("x"))).await.unwrap();
    let PlanOutcome::NotReady(not_ready) = outcome else {
        panic!("expected not ready");
    };
    assert!(not_ready.missing_ingredients);
    assert!(not_ready.missing_kitchenware);
    assert!(!not_ready.message.is_empty());

    assert_eq!(h.store.plan_count().await, 0);
    assert!(h.orchestrator.list_prompts(&newcomer).await.unwrap().is_empty());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_expired_ingredients_or_no_kitchenware_block_submit() {
    let h = harness(FakeProvider::default()).await;

    let expired = owner("Grace");
    h.store
        .add_ingredient(expired.id, "Milk", Some(Utc::now() - Duration::hours(1)))
        .await;
    h.store.add_kitchenware(expired.id, "Pot").await;

    let no_tools = owner("Linus");
    h.store
        .add_ingredient(no_tools.id, "Egg", Some(Utc::now() + Duration::days(1)))
        .await;

    for who in [&expired, &no_tools] {
        let outcome = h.orchestrator.submit(who, request(None)).await.unwrap();
        assert!(matches!(outcome, PlanOutcome::NotReady(_)));
    }
    assert_eq!(h.store.plan_count().await, 0);
}

#[tokio::test]
async fn test_invalid_request_creates_no_plan() {
    let h = harness(FakeProvider::default()).await;
    let mut req = request(None);
    req.meal_type = "Supper".to_string();

    let err = h.orchestrator.submit(&h.owner, req).await.unwrap_err();
    assert!(matches!(err, PlanningError::InvalidRequest(_)));
    assert_eq!(h.store.plan_count().await, 0);
}

#[tokio::test]
async fn test_prompt_sent_to_model_is_slimmed() {
    let h = harness(FakeProvider::default()).await;
    let plan = submit(&h, &h.owner, Some("quick pasta")).await;
    settle(&h, plan.id).await;

    let prompts = h.provider.prompts().await;
    assert_eq!(prompts.len(), 1);
    let sent = &prompts[0];
    assert!(sent.contains("ada@example.com"));
    assert!(sent.contains("quick pasta"));
    assert!(sent.contains("Saucepan"));
    assert!(!sent.contains(&h.owner.id.to_string()));
    assert!(!sent.contains(&plan.id.to_string()));
}

#[tokio::test]
async fn test_rerun_only_from_fail() {
    let h = harness(FakeProvider::with_script(vec![Ok(FENCED_X.to_string())])).await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    let err = h.orchestrator.rerun(&h.owner, plan.id).await.unwrap_err();
    match err {
        PlanningError::Conflict(message) => assert!(message.contains("Only failed plans")),
        other => panic!("expected conflict, got {:?}", other),
    }

    let stored = h.store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Success);
}

#[tokio::test]
async fn test_rerun_after_failure_succeeds() {
    let mut script: Vec<Result<String, String>> =
        (0..3).map(|_| Err("provider unavailable".to_string())).collect();
    script.push(Ok(FENCED_X.to_string()));
    let h = harness(FakeProvider::with_script(script)).await;

    let plan = submit(&h, &h.owner, None).await;
    let failed = settle(&h, plan.id).await;
    assert_eq!(failed.status, PlanStatus::Fail);

    let PlanOutcome::Scheduled(rerun) = h.orchestrator.rerun(&h.owner, plan.id).await.unwrap()
    else {
        panic!("expected rerun to be scheduled");
    };
    assert_eq!(rerun.status, PlanStatus::Waiting);
    assert_ne!(rerun.generation_id, failed.generation_id);

    let done = settle(&h, plan.id).await;
    assert_eq!(done.status, PlanStatus::Success);

    let logs = h.store.generation_logs(plan.id).await;
    assert_eq!(logs.len(), 4);
    assert!(logs[3].is_success());
    assert_eq!(logs[3].attempt, 1);
    assert_eq!(h.store.list_plan_recipes(plan.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rerun_without_inventory_keeps_fail() {
    let h = harness(bad_responses(3)).await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    h.store.clear_inventory(h.owner.id).await;
    let outcome = h.orchestrator.rerun(&h.owner, plan.id).await.unwrap();
    assert!(matches!(outcome, PlanOutcome::NotReady(_)));

    let stored = h.store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Fail);
    assert_eq!(h.provider.call_count(), 3);
}

#[tokio::test]
async fn test_commit_failure_forces_fail_without_partial_recipes() {
    let h = harness(FakeProvider::with_script(vec![Ok(PLAIN_Y.to_string())])).await;
    h.store.fail_next_commits(1).await;

    let plan = submit(&h, &h.owner, None).await;
    let plan = settle(&h, plan.id).await;

    assert_eq!(plan.status, PlanStatus::Fail);
    assert_eq!(h.provider.call_count(), 1);
    assert!(h.store.all_recipes().await.is_empty());

    let logs = h.store.generation_logs(plan.id).await;
    assert_eq!(logs.len(), 1);
    assert!(logs[0].error_message.contains("persist"));
}

#[tokio::test]
async fn test_delete_cascades_only_own_recipes() {
    let h = harness(FakeProvider::new().with_default_response(PLAIN_Y)).await;
    let doomed = submit(&h, &h.owner, None).await;
    let kept = submit(&h, &h.owner, None).await;
    settle(&h, doomed.id).await;
    settle(&h, kept.id).await;
    assert_eq!(h.store.all_recipes().await.len(), 4);

    let removed = h.orchestrator.delete_plan(&h.owner, doomed.id).await.unwrap();
    assert_eq!(removed, 2);

    assert!(h.store.get_plan(doomed.id).await.unwrap().is_none());
    let remaining = h.store.all_recipes().await;
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|r| r.plan_id == kept.id));
}

#[tokio::test]
async fn test_cannot_delete_waiting_plan() {
    let h = harness(FakeProvider::default()).await;
    let plan = h
        .store
        .create_plan(mealwise_core::NewPlan {
            owner_id: h.owner.id,
            title: "Pending".to_string(),
            tags: vec![],
            prompt: None,
            meal_type: mealwise_core::MealType::Brunch,
            party_size: 1,
            time_budget_minutes: 20,
            generation_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let err = h.orchestrator.delete_plan(&h.owner, plan.id).await.unwrap_err();
    assert!(matches!(err, PlanningError::Conflict(_)));
    assert!(h.store.get_plan(plan.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_other_owner_is_forbidden_everywhere() {
    let h = harness(FakeProvider::with_script(vec![Ok(FENCED_X.to_string())])).await;
    let plan = submit(&h, &h.owner, None).await;
    let plan = settle(&h, plan.id).await;

    let mallory = owner("Mallory");
    stock(&h.store, &mallory).await;
    let o = &h.orchestrator;

    assert!(matches!(
        o.get_plan(&mallory, plan.id).await,
        Err(PlanningError::Forbidden)
    ));
    assert!(matches!(
        o.get_plan_detail(&mallory, plan.id).await,
        Err(PlanningError::Forbidden)
    ));
    assert!(matches!(
        o.rerun(&mallory, plan.id).await,
        Err(PlanningError::Forbidden)
    ));
    assert!(matches!(
        o.edit_plan(&mallory, plan.id, "more spice").await,
        Err(PlanningError::Forbidden)
    ));
    assert!(matches!(
        o.close_plan(&mallory, plan.id).await,
        Err(PlanningError::Forbidden)
    ));
    assert!(matches!(
        o.delete_plan(&mallory, plan.id).await,
        Err(PlanningError::Forbidden)
    ));

    let stored = h.store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored, plan);
    assert_eq!(h.store.list_plan_recipes(plan.id).await.unwrap().len(), 1);
    assert!(o.list_plans(&mallory).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_plan_is_not_found() {
    let h = harness(FakeProvider::default()).await;
    assert!(matches!(
        h.orchestrator.get_plan(&h.owner, Uuid::new_v4()).await,
        Err(PlanningError::NotFound)
    ));
}

#[tokio::test]
async fn test_edit_replaces_recipes() {
    let h = harness(FakeProvider::with_script(vec![
        Ok(FENCED_X.to_string()),
        Ok(PLAIN_Y.to_string()),
    ]))
    .await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    let editing = h
        .orchestrator
        .edit_plan(&h.owner, plan.id, "  make it vegetarian ")
        .await
        .unwrap();
    assert_eq!(editing.status, PlanStatus::Waiting);

    let done = settle(&h, plan.id).await;
    assert_eq!(done.status, PlanStatus::Success);

    let titles: Vec<String> = h
        .store
        .list_plan_recipes(plan.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Y".to_string(), "Z".to_string()]);

    let prompts = h.provider.prompts().await;
    assert!(prompts[1].contains("make it vegetarian"));
    assert!(prompts[1].contains("\"title\":\"X\""));

    let logs = h.store.generation_logs(plan.id).await;
    assert_eq!(logs[1].task_name, "edit_plan");
}

#[tokio::test]
async fn test_failed_edit_keeps_previous_recipes() {
    let mut script = vec![Ok(FENCED_X.to_string())];
    script.extend((0..3).map(|_| Ok("nope".to_string())));
    let h = harness(FakeProvider::with_script(script)).await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    h.orchestrator
        .edit_plan(&h.owner, plan.id, "double it")
        .await
        .unwrap();
    let done = settle(&h, plan.id).await;

    assert_eq!(done.status, PlanStatus::Fail);
    let recipes = h.store.list_plan_recipes(plan.id).await.unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].title, "X");
}

#[tokio::test]
async fn test_edit_preconditions() {
    let h = harness(bad_responses(3)).await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    assert!(matches!(
        h.orchestrator.edit_plan(&h.owner, plan.id, "   ").await,
        Err(PlanningError::InvalidRequest(_))
    ));
    assert!(matches!(
        h.orchestrator.edit_plan(&h.owner, plan.id, "spicier").await,
        Err(PlanningError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_close_archives_finished_plan() {
    let h = harness(FakeProvider::with_script(vec![Ok(FENCED_X.to_string())])).await;
    let plan = submit(&h, &h.owner, None).await;
    settle(&h, plan.id).await;

    let closed = h.orchestrator.close_plan(&h.owner, plan.id).await.unwrap();
    assert_eq!(closed.status, PlanStatus::Closed);

    assert!(matches!(
        h.orchestrator.rerun(&h.owner, plan.id).await,
        Err(PlanningError::Conflict(_))
    ));
    assert!(matches!(
        h.orchestrator.close_plan(&h.owner, plan.id).await,
        Err(PlanningError::Conflict(_))
    ));
    assert_eq!(h.orchestrator.delete_plan(&h.owner, plan.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_plans_oldest_first() {
    let h = harness(FakeProvider::default()).await;
    let first = submit(&h, &h.owner, None).await;
    let second = submit(&h, &h.owner, None).await;
    settle(&h, first.id).await;
    settle(&h, second.id).await;

    let ids: Vec<Uuid> = h
        .orchestrator
        .list_plans(&h.owner)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

/// Never answers.
#[derive(Debug)]
struct StalledProvider;

#[async_trait::async_trait]
impl mealwise_core::LlmProvider for StalledProvider {
    async fn complete(
        &self,
        _system: &str,
        _prompt: &str,
    ) -> Result<String, mealwise_core::LlmError> {
        std::future::pending().await
    }

    fn provider_name(&self) -> &'static str {
        "stalled"
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

#[tokio::test]
async fn test_stalled_provider_ends_in_fail_and_can_be_rerun() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = PlanOrchestrator::new(
        store.clone(),
        store.clone(),
        RecipeGateway::new(Arc::new(StalledProvider)),
        PlannerConfig {
            max_attempts: 2,
            call_timeout: StdDuration::from_millis(50),
        },
    );
    let ada = owner("Ada");
    stock(&store, &ada).await;

    let PlanOutcome::Scheduled(plan) = orchestrator.submit(&ada, request(None)).await.unwrap()
    else {
        panic!("expected a plan");
    };
    assert!(orchestrator.is_generating(plan.id).await);

    tokio::time::timeout(
        StdDuration::from_secs(5),
        orchestrator.wait_for_generation(plan.id),
    )
    .await
    .expect("generation must end after the calls time out");

    assert!(!orchestrator.is_generating(plan.id).await);
    let stored = store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Fail);
    assert_eq!(store.generation_logs(plan.id).await.len(), 2);

    assert!(matches!(
        orchestrator.rerun(&ada, plan.id).await.unwrap(),
        PlanOutcome::Scheduled(_)
    ));
}

#[tokio::test]
async fn test_stranded_waiting_plans_are_failed_on_recovery() {
    let h = harness(FakeProvider::with_script(vec![Ok(FENCED_X.to_string())])).await;
    let finished = submit(&h, &h.owner, None).await;
    settle(&h, finished.id).await;

    let stranded = h
        .store
        .create_plan(mealwise_core::NewPlan {
            owner_id: h.owner.id,
            title: "Interrupted".to_string(),
            tags: vec![],
            prompt: None,
            meal_type: mealwise_core::MealType::Lunch,
            party_size: 2,
            time_budget_minutes: 30,
            generation_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    assert_eq!(h.orchestrator.recover_stranded_plans().await.unwrap(), 1);

    let stored = h.store.get_plan(stranded.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Fail);
    let untouched = h.store.get_plan(finished.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, PlanStatus::Success);

    assert_eq!(h.orchestrator.delete_plan(&h.owner, stranded.id).await.unwrap(), 0);
    assert_eq!(h.orchestrator.recover_stranded_plans().await.unwrap(), 0);
}
