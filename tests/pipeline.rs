use ndarray::{array, Axis};

use tier_net::parsing::{people, reference};
use tier_net::{encode, predict, train, AgeBounds, Dataset, NeuralNet, Tier, TierError, TrainConfig};

fn seeded_config(seed: u64) -> TrainConfig {
    TrainConfig {
        seed: Some(seed),
        ..TrainConfig::default()
    }
}

fn trained(seed: u64) -> NeuralNet {
    train(&reference::dataset(), &seeded_config(seed), |_| {}).unwrap()
}

#[test]
fn emits_one_progress_event_per_epoch() {
    let mut epochs = vec![];
    let mut losses = vec![];

    train(&reference::dataset(), &seeded_config(1), |stats| {
        epochs.push(stats.epoch);
        losses.push(stats.loss);
    })
    .unwrap();

    assert_eq!(epochs, (0..200).collect::<Vec<_>>());
    assert!(losses.iter().all(|loss| loss.is_finite()));
    assert!(losses[199] < losses[0]);
}

#[test]
fn young_red_person_from_rio_is_medium() {
    for seed in [3, 17, 2024] {
        let neural_net = trained(seed);
        let features = encode(28.0, "red", "Rio").unwrap();
        assert_eq!(features, array![0.28, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);

        let result = predict(&neural_net, &features).unwrap();
        let top = result.rank();

        assert_eq!(top.tier, Tier::Medium);
        assert_eq!(top.label(), "medium");
        assert!(top.probability > 0.5);
    }
}

#[test]
fn blue_person_from_sao_paulo_is_premium() {
    let neural_net = trained(5);
    let features = encode(30.0, "blue", "São Paulo").unwrap();

    let result = predict(&neural_net, &features).unwrap();
    let top = result.rank();

    assert_eq!(top.tier, Tier::Premium);
    assert!(top.probability > 0.8);
}

#[test]
fn probabilities_sum_to_one_on_training_rows() {
    let dataset = reference::dataset();
    let neural_net = trained(11);

    for row in dataset.data.axis_iter(Axis(0)) {
        let result = predict(&neural_net, &row.to_owned()).unwrap();
        let total: f64 = result.entries().iter().map(|p| p.probability).sum();

        assert!((total - 1.0).abs() < 1e-6);
        assert!(result.entries().iter().all(|p| (0.0..=1.0).contains(&p.probability)));
    }
}

#[test]
fn fits_the_reference_labels() {
    let dataset = reference::dataset();
    let neural_net = trained(8);

    for (row, label) in dataset.data.axis_iter(Axis(0)).zip(dataset.target.axis_iter(Axis(0))) {
        let top = *predict(&neural_net, &row.to_owned()).unwrap().rank();

        assert_eq!(label[top.tier.index()], 1.0);
    }
}

#[test]
fn predict_is_idempotent() {
    let neural_net = trained(4);
    let features = encode(60.0, "green", "Rio").unwrap();

    let first = predict(&neural_net, &features).unwrap();
    let second = predict(&neural_net, &features).unwrap();

    assert_eq!(first, second);
}

#[test]
fn predict_rejects_wrong_width_input() {
    let neural_net = trained(4);

    assert!(matches!(
        predict(&neural_net, &array![0.3, 1.0, 0.0]),
        Err(TierError::Shape { expected: 7, got: 3, .. })
    ));
}

#[test]
fn train_rejects_wrong_width_rows() {
    let mut narrow = reference::dataset();
    narrow.data = narrow.data.slice(ndarray::s![.., ..6]).to_owned();
    assert!(matches!(
        train(&narrow, &seeded_config(1), |_| {}),
        Err(TierError::Shape { what: "feature", expected: 7, got: 6, .. })
    ));

    let mut wide = reference::dataset();
    wide.target = ndarray::concatenate![Axis(1), wide.target, wide.target];
    assert!(matches!(
        train(&wide, &seeded_config(1), |_| {}),
        Err(TierError::Shape { what: "label", expected: 3, got: 6, .. })
    ));
}

#[test]
fn train_rejects_empty_dataset() {
    let empty = Dataset {
        data: ndarray::Array2::zeros((0, 7)),
        target: ndarray::Array2::zeros((0, 3)),
    };

    assert!(matches!(
        train(&empty, &TrainConfig::default(), |_| {}),
        Err(TierError::EmptyDataset)
    ));
}

#[test]
fn unknown_categories_never_reach_the_model() {
    assert!(matches!(encode(30.0, "purple", "Rio"), Err(TierError::Encoding { .. })));
    assert!(matches!(encode(30.0, "blue", "Salvador"), Err(TierError::Encoding { .. })));
}

#[test]
fn trains_from_people_csv() {
    let csv = "\
name,age,color,location,tier
Erick,33,blue,São Paulo,premium
Lia,45,blue,São Paulo,premium
Ana,10,red,Rio,medium
Rui,20,red,Rio,medium
Carlos,90,green,Curitiba,basic
Ivo,80,green,Curitiba,basic
";
    let dataset = people::parse_reader(csv.as_bytes(), AgeBounds::default()).unwrap();
    let neural_net = train(&dataset, &seeded_config(9), |_| {}).unwrap();

    let features = encode(85.0, "green", "Curitiba").unwrap();
    let top = *predict(&neural_net, &features).unwrap().rank();

    assert_eq!(top.tier, Tier::Basic);
}

#[test]
fn nan_age_is_rejected_instead_of_ignored() {
    let neural_net = trained(4);

    assert!(matches!(encode(f64::NAN, "red", "Rio"), Err(TierError::NonFiniteAge(_))));

    let mut features = encode(28.0, "red", "Rio").unwrap();
    features[0] = f64::NAN;
    assert!(matches!(
        predict(&neural_net, &features),
        Err(TierError::NonFinite { table: "feature", .. })
    ));
}
