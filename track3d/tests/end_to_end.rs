use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use track3d::{
    associate::{AssociationSettings, Associator},
    geom::{look_at, Projector},
    nalgebra::Point3,
    optimize::calibrate_tracks,
    CalibrationSettings, CameraConfig, CameraModel, CameraParams, CameraSlot, CameraSystem,
    RigConfig, ScreenCoordinate, Track,
};

fn rig() -> RigConfig {
    RigConfig::new(
        CameraConfig::new(1.0, 16.0 / 9.0, Point3::new(0.0, 0.0, 6.0)),
        CameraConfig::new(1.0, 16.0 / 9.0, Point3::new(25.0, 5.0, 8.0)),
    )
}

fn truth() -> CameraParams {
    let rig = rig();
    let target = Point3::new(10.0, 22.0, 0.0);
    let first = look_at(rig.first.position, target);
    let second = look_at(rig.second.position, target);
    CameraParams::new(first.theta, second.theta, 15.0f64.atan2(10.0), first.phi, second.phi)
}

struct Scene {
    rng: Pcg64,
    system: CameraSystem,
}

impl Scene {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
            system: CameraSystem::new(rig()).with_params(truth()),
        }
    }

    fn observe(&mut self, slot: CameraSlot, start: usize, path: &[Point3<f64>]) -> Track {
        let projector = Projector::from_system(&self.system, slot);
        let rng = &mut self.rng;
        let samples = path
            .iter()
            .map(|&point| {
                let seen = projector.screen_coordinate(point).unwrap();
                ScreenCoordinate::new(
                    seen.p() + rng.gen_range(-0.0005..0.0005),
                    seen.q() + rng.gen_range(-0.0005..0.0005),
                )
            })
            .collect::<Vec<_>>();
        Track::starting_at(0.9, start, samples).unwrap()
    }
}

#[test]
fn calibrate_then_associate() {
    let _ = pretty_env_logger::try_init();
    let mut scene = Scene::new(42);
    let start = Point3::new(5.0, 15.0, 0.0);
    let end = Point3::new(15.0, 30.0, 0.0);
    let walker: Vec<_> = (0..50)
        .map(|i| start + (end - start) * (i as f64 / 49.0))
        .collect();
    let parked = vec![Point3::new(12.0, 20.0, 0.0); 70];

    let first = vec![
        scene.observe(CameraSlot::First, 0, &parked),
        scene.observe(CameraSlot::First, 10, &walker),
    ];
    let second = vec![
        scene.observe(CameraSlot::Second, 10, &walker),
        scene.observe(CameraSlot::Second, 0, &parked),
        scene.observe(CameraSlot::Second, 80, &walker[..20]),
    ];

    let truth = truth();
    let guess = CameraSystem::new(rig()).with_params(CameraParams::new(
        truth.theta1 + 0.08,
        truth.theta2 - 0.06,
        truth.phi + 0.2,
        truth.phi1 - 0.1,
        truth.phi2 + 0.1,
    ));
    let settings = CalibrationSettings::default();
    let calibration = calibrate_tracks(&guess, &first[1], &second[0], settings, None).unwrap();
    assert_eq!(calibration.iterations, 5000);
    assert!(!calibration.interrupted);

    let params = calibration.system.params;
    assert_relative_eq!(params.theta1, truth.theta1, epsilon = 0.01);
    assert_relative_eq!(params.theta2, truth.theta2, epsilon = 0.01);
    assert_relative_eq!(params.phi, truth.phi, epsilon = 0.01);
    assert_relative_eq!(params.phi1, truth.phi1, epsilon = 0.01);
    assert_relative_eq!(params.phi2, truth.phi2, epsilon = 0.01);

    let association = AssociationSettings::default();
    let matches = Associator::new(&calibration.system, &settings, association)
        .associate(&first, &second)
        .unwrap();
    assert_eq!(matches.len(), 1);
    let walk = &matches[0];
    assert_eq!((walk.i, walk.j), (1, 0));
    assert!(walk.loss < association.max_loss);
    assert_eq!(walk.span.start, 10);
    assert_eq!(walk.size(), 50);
    assert!(walk.displacement() > association.min_dist);
    for (point, expected) in walk.points.iter().zip(&walker) {
        assert!((point - expected).norm() < 1.0);
    }
}
