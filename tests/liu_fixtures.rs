// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

// Published reference fixtures for the Liu moment-matching approximation and
// SKAT's modified Liu p-value.

mod util;

#[cfg(feature = "probability_distributions")]
mod liu_fixture_tests {
    use super::util::assert_close;
    use chi2mix_kernels::{
        liu_survival, mixture_moment_params, mod_liu_pvalue, mod_liu_pvalue_from_cumulants,
        Cumulants, KernelError, MomentMatching,
    };

    #[test]
    fn skewness_regime_literal() {
        let r = liu_survival(
            &[2.0, 6.0],
            &[0.5, 0.4, 0.1],
            Some([1.0, 2.0, 1.0].as_slice()),
            Some([1.0, 0.6, 0.8].as_slice()),
            MomentMatching::LIU,
            None,
            None,
        )
        .unwrap();
        assert_close(r.p[0], 0.4577529852208846, 1e-9);
        assert_close(r.p[1], 0.0310791861868015, 1e-9);
        assert!(r.noncentrality > 0.0);
    }

    #[test]
    fn kurtosis_regime_literal() {
        let r = liu_survival(
            &[3.5],
            &[0.35, 0.15, 0.35, 0.15],
            Some([1.0, 1.0, 6.0, 2.0].as_slice()),
            Some([6.0, 2.0, 6.0, 2.0].as_slice()),
            MomentMatching::KURTOSIS,
            None,
            None,
        )
        .unwrap();
        assert_close(r.p[0], 0.9563148345837034, 1e-9);
        assert_close(r.dof, 11.575377563761194, 1e-9);
        assert_close(r.noncentrality, 10.278852084059992, 1e-9);
    }

    #[test]
    fn single_large_weight_among_zeros() {
        let mut w = vec![0.0; 64];
        w.push(4985811.050871694);
        let r = liu_survival(&[906024.952053349], &w, None, None, MomentMatching::LIU, None, None)
            .unwrap();
        assert_close(r.p[0], 0.6698986705489816, 1e-9);
        assert_close(r.dof, 1.0, 1e-12);
        assert_eq!(r.noncentrality, 0.0);
        assert_close(r.info.mu_q, 4985811.050871694, 1e-12);
        assert_close(r.info.sigma_q, 7051001.607572404, 1e-12);
        assert_close(r.info.mu_x, 1.0, 1e-12);
        assert_close(r.info.sigma_x, 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn two_central_weights() {
        let r = liu_survival(&[3.245], &[1.02, 3.0], None, None, MomentMatching::LIU, None, None)
            .unwrap();
        assert_close(r.p[0], 0.4054052698281726, 1e-9);
        assert_close(r.dof, 1.2854059895411523, 1e-10);
        assert_eq!(r.noncentrality, 0.0);
        assert_close(r.info.mu_q, 4.02, 1e-14);
        assert_close(r.info.sigma_q, 4.481160563961081, 1e-12);
        assert_close(r.info.t_star[0], (3.245 - 4.02) / 4.481160563961081, 1e-12);
    }

    #[test]
    fn noncentral_pair_at_two() {
        let r = liu_survival(
            &[2.0],
            &[0.7, 0.3],
            Some([2.0, 1.0].as_slice()),
            Some([1.160032, 2.0].as_slice()),
            MomentMatching::LIU,
            None,
            None,
        )
        .unwrap();
        assert_close(r.p[0], 0.6243581256085478, 1e-9);
    }

    #[test]
    fn survival_is_monotone_across_conventions() {
        let t: Vec<f64> = (0..200).map(|i| i as f64 * 0.1).collect();
        for matching in [
            MomentMatching::LIU,
            MomentMatching::KURTOSIS,
            MomentMatching::LIU.normalized(),
            MomentMatching::KURTOSIS.normalized(),
        ] {
            let r = liu_survival(&t, &[0.9, 0.5, 0.3, 0.1], None, None, matching, None, None)
                .unwrap();
            let p = r.p.as_slice().unwrap();
            assert!(p.windows(2).all(|w| w[1] <= w[0]), "{matching:?}");
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn moment_params_are_reported_on_the_raw_scale() {
        let w = [4.0, 2.0, 2.0];
        let raw = mixture_moment_params(&w, None, None, MomentMatching::KURTOSIS).unwrap();
        let norm =
            mixture_moment_params(&w, None, None, MomentMatching::KURTOSIS.normalized()).unwrap();
        assert_close(raw.mu_q, 8.0, 1e-14);
        assert_close(norm.mu_q, 8.0, 1e-14);
        assert_close(raw.sigma_q, (2.0_f64 * 24.0).sqrt(), 1e-14);
        assert_close(norm.sigma_q, raw.sigma_q, 1e-13);
        assert_close(norm.dof, raw.dof, 1e-13);
    }

    #[test]
    fn mod_liu_reference_values() {
        let r = mod_liu_pvalue(&[2.0, 5.0], &[0.5, 0.4, 0.1], false).unwrap();
        assert_close(r.p[0], 0.12355245809711383, 1e-10);
        assert_close(r.p[1], 0.004680465048181415, 1e-10);
        assert_close(r.dof, 2.0, 1e-13);

        let n = mod_liu_pvalue(&[6.0], &[3.0, 1.0, 0.25, 0.25], true).unwrap();
        assert_close(n.p[0], 0.23844454723472688, 1e-10);
        assert_close(n.dof, 1.2500714489854243, 1e-11);
    }

    #[test]
    fn mod_liu_rejects_inconsistent_moments() {
        // c3 too large for c4: s1² > s2 with a > 1.5 drives l negative
        let c = Cumulants::new(2.0, 1.0, 1.0, 0.5);
        assert!(matches!(
            mod_liu_pvalue_from_cumulants(&[1.0], &c),
            Err(KernelError::NegativeDegreesOfFreedom(_))
        ));
    }

    #[test]
    fn invalid_mixtures() {
        assert!(liu_survival(&[1.0], &[], None, None, MomentMatching::LIU, None, None).is_err());
        assert!(liu_survival(
            &[1.0],
            &[1.0],
            Some([1.0].as_slice()),
            Some([-1.0].as_slice()),
            MomentMatching::LIU,
            None,
            None
        )
        .is_err());
        assert!(mod_liu_pvalue(&[f64::INFINITY], &[1.0, 2.0], false).is_err());
    }
}
