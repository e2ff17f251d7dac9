use form_engine::{FieldValue, SessionPhase, SubmissionState};
use pretty_assertions::assert_eq;
use scribe::{
    action::Action,
    config::{Config, ServiceConfig},
    scribe::App,
    services,
};

#[tokio::test(start_paused = true)]
async fn offline_demo_form_submits_through_the_app() {
    let service = services::connect(&ServiceConfig::default(), true).unwrap();
    let app = App::new(Config::default(), service);
    let view = app
        .handle()
        .wait_for(|v| v.phase != SessionPhase::Loading)
        .await
        .unwrap();
    assert_eq!(view.fields.len(), 3);
    assert_eq!(view.submit_label, "Submit");

    for (name, value) in [
        ("name_8066616423", FieldValue::text("Ada")),
        ("age_12345", FieldValue::text("36")),
        ("terms_001", FieldValue::Bool(true)),
    ] {
        let action = Action::SetValue {
            name: name.into(),
            value,
        };
        assert_eq!(app.perform(&action).await, None);
    }
    assert_eq!(app.handle().view().interactions, 3);

    assert_eq!(app.perform(&Action::Submit).await, None);
    let view = app
        .handle()
        .wait_for(|v| matches!(v.submission, SubmissionState::Confirmed(_)))
        .await
        .unwrap();
    assert_eq!(
        view.submit_label,
        "Form submitted successfully! Submission ID: 101"
    );

    assert_eq!(
        app.perform(&Action::Submit).await,
        Some(Action::Error(
            "submit rejected: form already submitted; reset before submitting again".into()
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_field_is_reported_not_fatal() {
    let service = services::connect(&ServiceConfig::default(), true).unwrap();
    let app = App::new(Config::default(), service);
    app.handle().wait_for(|v| v.is_ready()).await.unwrap();

    let follow_up = app
        .perform(&Action::SetValue {
            name: "nope".into(),
            value: FieldValue::text("x"),
        })
        .await;
    assert_eq!(follow_up, Some(Action::Error("unknown field: nope".into())));
    assert_eq!(app.handle().view().interactions, 0);
}
