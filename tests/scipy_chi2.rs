// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

// Reference values from SciPy 1.16.1 (`scipy.stats.chi2`) and, for the deep
// tails, mpmath at 40 digits.
//
// Each test compares our kernel outputs against the reference with a per-test
// tolerance. NaN/Inf equality is handled by util::assert_slice_close.

mod util;

#[cfg(feature = "probability_distributions")]
mod scipy_chi2_tests {
    use super::util::{assert_close, assert_slice_close};
    use chi2mix_kernels::kernels::scientific::distributions::univariate::chi_squared::{
        chi_square_cdf, chi_square_cdf_to, chi_square_log_sf, chi_square_pdf, chi_square_pdf1,
        chi_square_sf,
    };

    #[test]
    fn chi2_pdf_df_1() {
        let x = [0.10000000000000001, 0.5, 1.0, 2.0, 5.0, 10.0];
        let expect = [
            1.2000389484301359,
            0.43939128946772243,
            0.24197072451914337,
            0.10377687435514868,
            0.014644982561926487,
            0.00085003666025203336,
        ];
        let got = chi_square_pdf(&x, 1.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
        for (&xi, &e) in x.iter().zip(expect.iter()) {
            assert_close(chi_square_pdf1(xi), e, 1e-12);
        }
    }

    #[test]
    fn chi2_pdf_df_2() {
        let x = [0.10000000000000001, 0.5, 1.0, 2.0, 5.0, 10.0];
        let expect = [
            0.47561471225035701,
            0.38940039153570244,
            0.30326532985631671,
            0.18393972058572114,
            0.041042499311949393,
            0.0033689734995427331,
        ];
        let got = chi_square_pdf(&x, 2.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_pdf_near_zero() {
        let x = [0.0, 1e-10, 1.0000000000000001e-05, 0.01, 0.10000000000000001];
        let expect = [
            0.5,
            0.499999999975,
            0.49999750000624998,
            0.49750623959634116,
            0.47561471225035701,
        ];
        let got = chi_square_pdf(&x, 2.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-10);
    }

    #[test]
    fn chi2_pdf_extreme_values() {
        let x = [0.01, 1.0, 10.0, 50.0, 100.0];
        let expect = [
            0.00013231751582567066,
            0.080656908173047798,
            0.028334555341734475,
            6.5295277212572104e-10,
            2.564866208902142e-20,
        ];
        let got = chi_square_pdf(&x, 5.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_pdf_negative_values() {
        let x = [-10.0, -1.0, -0.10000000000000001, 0.0, 1.0];
        let expect = [0.0, 0.0, 0.0, 0.0, 0.24197072451914337];
        let got = chi_square_pdf(&x, 3.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_cdf_df_1() {
        let x = [0.10000000000000001, 0.5, 1.0, 2.0, 5.0, 10.0];
        let expect = [
            0.24817036595415076,
            0.52049987781304663,
            0.68268949213708585,
            0.84270079294971512,
            0.97465268132253169,
            0.9984345977419975,
        ];
        let got = chi_square_cdf(&x, 1.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_cdf_df_10() {
        let x = [0.10000000000000001, 0.5, 1.0, 2.0, 5.0, 10.0];
        let expect = [
            2.4979513360065075e-09,
            6.6117105610342441e-06,
            0.00017211562995584072,
            0.0036598468273437131,
            0.10882198108584877,
            0.55950671493478787,
        ];
        let got = chi_square_cdf(&x, 10.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_cdf_large_df() {
        let x = [0.10000000000000001, 0.5, 1.0, 2.0, 5.0, 10.0];
        let expect = [
            2.7805877168288313e-130,
            2.0299524618646476e-95,
            1.7887765104351563e-80,
            1.2337508979097585e-65,
            2.2386989282289475e-46,
            2.1810592140785249e-32,
        ];
        let got = chi_square_cdf(&x, 100.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_cdf_near_zero_and_negative() {
        let x = [0.0, 1e-10, 1.0000000000000001e-05, 0.01, 0.10000000000000001];
        let expect = [
            0.0,
            4.9999999998750022e-11,
            4.9999875000208323e-06,
            0.004987520807317688,
            0.048770575499285991,
        ];
        let got = chi_square_cdf(&x, 2.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-10);

        let x = [-10.0, -1.0, -0.10000000000000001, 0.0, 1.0];
        let expect = [0.0, 0.0, 0.0, 0.0, 0.19874804309879915];
        let got = chi_square_cdf(&x, 3.0, None, None).unwrap();
        assert_slice_close(got.as_slice().unwrap(), &expect, 1e-12);
    }

    #[test]
    fn chi2_sf_fractional_df() {
        let x = [0.5, 3.0, 12.0, 80.0];
        let got = chi_square_sf(&x, 3.3, None, None).unwrap();
        let expect = [
            0.94137311510096777,
            0.44295527391254876,
            0.009734956582799098,
            5.2747584071622562e-17,
        ];
        for (g, e) in got.iter().zip(expect.iter()) {
            // relative, the last value is far below the absolute tolerance
            assert!(((g - e) / e).abs() < 1e-10, "got {g}, expect {e}");
        }
    }

    #[test]
    fn chi2_log_sf_deep_tail() {
        let got = chi_square_log_sf(&[3000.0, 0.0], 2.0, None, None).unwrap();
        assert_close(got[0], -1500.0, 1e-12);
        assert_eq!(got[1], 0.0);
        let sf = chi_square_sf(&[3000.0], 2.0, None, None).unwrap();
        assert_eq!(sf[0], 0.0);
    }

    #[test]
    fn chi2_param_validation() {
        assert!(chi_square_pdf(&[0.5], 0.0, None, None).is_err());
        assert!(chi_square_cdf(&[0.5], -2.0, None, None).is_err());
        assert!(chi_square_sf(&[0.5], f64::NAN, None, None).is_err());
        let mut out = [0.0; 3];
        assert!(chi_square_cdf_to(&[0.5, 1.0], 2.0, &mut out, None, None).is_err());
    }
}
