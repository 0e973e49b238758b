//! Kullback-Leibler divergence through the Bregman identity
use approx::assert_relative_eq;
use expfam::prelude::*;
use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use special::Gamma as _;

const TOL: f64 = 1E-9;

fn positive_vec(dim: usize, rng: &mut SmallRng) -> DVector<f64> {
    DVector::from_fn(dim, |_, _| rng.gen_range(0.5..3.0))
}

fn well_conditioned_pd(dim: usize, rng: &mut SmallRng) -> DMatrix<f64> {
    let b = DMatrix::from_fn(dim, dim, |_, _| rng.gen_range(-1.0..1.0));
    &b * b.transpose() / dim as f64 + DMatrix::identity(dim, dim)
}

#[test]
fn dirichlet_matches_closed_form() {
    let ap = [2.0, 3.0, 5.0];
    let aq = [1.0, 1.0, 1.0];
    let p = Dirichlet::from_params(&DVector::from_column_slice(&ap)).unwrap();
    let q = Dirichlet::from_params(&DVector::from_column_slice(&aq)).unwrap();

    let sum_p: f64 = ap.iter().sum();
    let sum_q: f64 = aq.iter().sum();
    let mut expected = sum_p.ln_gamma().0 - sum_q.ln_gamma().0;
    for i in 0..3 {
        expected += aq[i].ln_gamma().0 - ap[i].ln_gamma().0
            + (ap[i] - aq[i]) * (ap[i].digamma() - sum_p.digamma());
    }
    assert_relative_eq!(
        kl_divergence(&p, &q).unwrap(),
        expected,
        epsilon = TOL
    );
}

#[test]
fn gamma_matches_closed_form() {
    let (ap, bp) = (3.0, 2.0);
    let (aq, bq) = (1.5, 0.5);
    let p = Gamma::from_params(ap, bp).unwrap();
    let q = Gamma::from_params(aq, bq).unwrap();

    let expected = aq.ln_gamma().0 - ap.ln_gamma().0
        + (ap - aq) * ap.digamma()
        + aq * (bp.ln() - bq.ln())
        + ap * (bq - bp) / bp;
    assert_relative_eq!(
        kl_divergence(&p, &q).unwrap(),
        expected,
        epsilon = TOL
    );
}

#[test]
fn self_divergence_is_zero_for_every_family() {
    let mut rng = SmallRng::seed_from_u64(0xbeef);

    let dir = Dirichlet::from_params(&positive_vec(4, &mut rng)).unwrap();
    assert_eq!(kl_divergence(&dir, &dir).unwrap(), 0.0);

    let ng = NormalGamma::from_params(
        &DVector::from_column_slice(&[0.5, -0.5]),
        &positive_vec(2, &mut rng),
        &positive_vec(2, &mut rng),
        &positive_vec(2, &mut rng),
    )
    .unwrap();
    assert_eq!(kl_divergence(&ng, &ng).unwrap(), 0.0);

    let nw = NormalWishart::from_params(
        &DVector::from_column_slice(&[0.5, -0.5]),
        1.5,
        &well_conditioned_pd(2, &mut rng),
        3.0,
    )
    .unwrap();
    assert_eq!(kl_divergence(&nw, &nw).unwrap(), 0.0);

    let gam = Gamma::from_params(2.0, 3.0).unwrap();
    assert_eq!(kl_divergence(&gam, &gam).unwrap(), 0.0);
}

#[test]
fn divergence_is_non_negative_dirichlet() {
    let mut rng = SmallRng::seed_from_u64(0x11);
    for dim in 2..6 {
        for _ in 0..10 {
            let p = Dirichlet::from_params(&positive_vec(dim, &mut rng))
                .unwrap();
            let q = Dirichlet::from_params(&positive_vec(dim, &mut rng))
                .unwrap();
            assert!(kl_divergence(&p, &q).unwrap() >= -TOL);
        }
    }
}

#[test]
fn divergence_is_non_negative_normal_gamma() {
    let mut rng = SmallRng::seed_from_u64(0x22);
    for _ in 0..10 {
        let dim = 3;
        let p = NormalGamma::from_params(
            &DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0)),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
        )
        .unwrap();
        let q = NormalGamma::from_params(
            &DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0)),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
        )
        .unwrap();
        assert!(kl_divergence(&p, &q).unwrap() >= -TOL);
    }
}

#[test]
fn divergence_is_non_negative_normal_wishart() {
    let mut rng = SmallRng::seed_from_u64(0x33);
    for _ in 0..10 {
        let dim = 3;
        let p = NormalWishart::from_params(
            &DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0)),
            rng.gen_range(0.5..2.0),
            &well_conditioned_pd(dim, &mut rng),
            dim as f64 + rng.gen_range(0.5..2.0),
        )
        .unwrap();
        let q = NormalWishart::from_params(
            &DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0)),
            rng.gen_range(0.5..2.0),
            &well_conditioned_pd(dim, &mut rng),
            dim as f64 + rng.gen_range(0.5..2.0),
        )
        .unwrap();
        assert!(kl_divergence(&p, &q).unwrap() >= -TOL);
    }
}

#[test]
fn divergence_is_non_negative_joint_families() {
    let mut rng = SmallRng::seed_from_u64(0x44);
    let (ncomp, dim) = (3, 2);
    for _ in 0..5 {
        let means = |rng: &mut SmallRng| {
            DMatrix::from_fn(ncomp, dim, |_, _| rng.gen_range(-1.0..1.0))
        };

        let p = JointNormalGamma::from_params(
            &means(&mut rng),
            &DMatrix::from_fn(ncomp, dim, |_, _| rng.gen_range(0.5..3.0)),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
        )
        .unwrap();
        let q = JointNormalGamma::from_params(
            &means(&mut rng),
            &DMatrix::from_fn(ncomp, dim, |_, _| rng.gen_range(0.5..3.0)),
            &positive_vec(dim, &mut rng),
            &positive_vec(dim, &mut rng),
        )
        .unwrap();
        assert!(kl_divergence(&p, &q).unwrap() >= -TOL);

        let p = JointNormalWishart::from_params(
            &means(&mut rng),
            &positive_vec(ncomp, &mut rng),
            &well_conditioned_pd(dim, &mut rng),
            dim as f64 + 1.0,
        )
        .unwrap();
        let q = JointNormalWishart::from_params(
            &means(&mut rng),
            &positive_vec(ncomp, &mut rng),
            &well_conditioned_pd(dim, &mut rng),
            dim as f64 + 1.0,
        )
        .unwrap();
        assert!(kl_divergence(&p, &q).unwrap() >= -TOL);
    }
}

#[test]
fn divergence_grows_with_parameter_distance() {
    let p = Gamma::from_params(2.0, 2.0).unwrap();
    let near = Gamma::from_params(2.1, 2.0).unwrap();
    let far = Gamma::from_params(4.0, 2.0).unwrap();
    let d_near = kl_divergence(&p, &near).unwrap();
    let d_far = kl_divergence(&p, &far).unwrap();
    assert!(d_near > 0.0);
    assert!(d_far > d_near);
}
