//! A full game driven from the default configuration

use rubyle::config::{load_defaults, Loader};
use rubyle::diff::MatchLabel;
use rubyle::error::{SessionError, SubmitError};
use rubyle::formats::to_tags;
use rubyle::session::{Session, Severity};
use std::time::{Duration, Instant};

fn default_session() -> Session {
    let config = load_defaults().unwrap();
    let reference = config.game.reference_source().unwrap();
    Session::start(&reference, &config.settings()).unwrap()
}

#[test]
fn test_game_from_default_configuration() {
    let mut session = default_session();
    assert_eq!(
        session.symbols().iter().map(String::as_str).collect::<Vec<_>>(),
        ["+", "-", "<=", "fibo", "n"]
    );

    let first = session.submit("puts fibo 10").unwrap();
    assert_eq!(to_tags(&first.source, &first.spans), "puts <weak>fibo 10</weak>");

    let err = session.submit("def fibo(n").unwrap_err();
    assert!(matches!(err, SubmitError::Syntax(_)));
    assert_eq!(session.guesses().len(), 1);

    let deadline = session.alert().and_then(|alert| alert.expires_at).unwrap();
    assert!(deadline <= Instant::now() + Duration::from_millis(5000));
    assert!(session.expire_alert(deadline + Duration::from_millis(1)));

    let reference = session.reference().source().to_string();
    let solved = session.submit(&reference).unwrap();
    assert!(solved.spans.iter().any(|span| span.label == Some(MatchLabel::Strong)));
    assert!(session.is_solved());
    assert_eq!(session.alert().map(|alert| alert.severity), Some(Severity::Success));
}

#[test]
fn test_malformed_reference_from_configuration() {
    let config = Loader::new()
        .set_override("game.reference", "def broken(")
        .unwrap()
        .build()
        .unwrap();
    let reference = config.game.reference_source().unwrap();
    let err = Session::start(&reference, &config.settings()).unwrap_err();
    assert!(matches!(err, SessionError::MalformedReference(_)));
}
