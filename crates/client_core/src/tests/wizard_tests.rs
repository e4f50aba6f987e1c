use super::*;

fn wizard_with(ids: &[u32]) -> Wizard {
    let mut wizard = Wizard::default();
    for &id in ids {
        wizard.add_flower(FlowerId(id)).expect("add");
    }
    wizard
}

#[test]
fn pick_step_requires_soft_minimum() {
    let mut wizard = wizard_with(&[1, 2, 3, 4, 5]);
    assert!(!wizard.can_proceed());
    assert_eq!(
        wizard.next(),
        Err(WizardError::NotEnoughFlowers { have: 5, need: 6 })
    );
    assert_eq!(wizard.step(), WizardStep::PickFlowers);

    wizard.add_flower(FlowerId(5)).expect("add");
    assert_eq!(wizard.next(), Ok(WizardStep::Customize));
}

#[test]
fn eleventh_flower_reports_too_many() {
    let mut wizard = wizard_with(&[1; 10]);
    assert_eq!(
        wizard.add_flower(FlowerId(2)),
        Err(WizardError::TooManyFlowers)
    );
    assert_eq!(wizard.draft().selection.total(), 10);
}

#[test]
fn step_specific_actions_are_guarded() {
    let mut wizard = wizard_with(&[12, 12, 12, 1, 1, 1]);
    assert!(matches!(
        wizard.shuffle(),
        Err(WizardError::WrongStep {
            expected: WizardStep::Customize,
            ..
        })
    ));

    wizard.next().expect("to customize");
    assert!(wizard.add_flower(FlowerId(2)).is_err());
    let order = wizard.shuffle_seeded(9).expect("shuffle");
    assert_eq!(order.len(), 6);
    wizard.set_greenery(2).expect("greenery");

    wizard.next().expect("to card");
    wizard
        .set_letter(Letter {
            sender: "A".into(),
            recipient: "B".into(),
            message: "C".into(),
        })
        .expect("letter");
    assert!(wizard.request().is_err());

    wizard.next().expect("to share");
    assert_eq!(wizard.next(), Err(WizardError::AtLastStep));

    let request = wizard.request().expect("request");
    assert_eq!(request.flower_order, order);
    assert_eq!(request.greenery, 2);
    assert_eq!(request.letter.message, "C");
}

#[test]
fn back_saturates_and_keeps_draft() {
    let mut wizard = wizard_with(&[3, 3, 3, 3, 3, 3]);
    wizard.next().expect("customize");
    wizard.shuffle_seeded(1).expect("shuffle");

    assert_eq!(wizard.back(), WizardStep::PickFlowers);
    assert_eq!(wizard.back(), WizardStep::PickFlowers);
    assert!(wizard.draft().flower_order.is_some());

    wizard.remove_flower(FlowerId(3)).expect("remove");
    assert!(wizard.draft().flower_order.is_none());
    assert_eq!(wizard.draft().selection.count_of(FlowerId(3)), 5);
}

#[test]
fn step_titles_follow_flow_order() {
    let titles: Vec<_> = WizardStep::ALL.iter().map(|step| step.title()).collect();
    assert_eq!(
        titles,
        ["Pick Flowers", "Customize Bouquet", "Write Card", "Share"]
    );
}
