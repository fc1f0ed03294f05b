#[cfg(test)]
mod proptests {
    use crate::converter::Converter;
    use crate::duration::{format_iso, parse_duration};
    use crate::list::List;
    use crate::primitive::{
        BINARY, Binary, Boolean, DECIMAL, HEXADECIMAL, Hex, Integer, OCTAL, Octal, Text,
    };
    use crate::urls::normalize;
    use proptest::prelude::*;

    fn case_variants(token: &'static str) -> impl Strategy<Value = String> {
        proptest::collection::vec(any::<bool>(), token.len()).prop_map(move |upper| {
            token
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_boolean_tokens_any_case(
            truthy in prop_oneof![case_variants("true"), case_variants("yes"), Just("1".to_string())],
            falsy in prop_oneof![case_variants("false"), case_variants("no"), Just("0".to_string())],
        ) {
            let converter = Boolean::default();
            prop_assert!(converter.convert(&truthy).unwrap());
            prop_assert!(!converter.convert(&falsy).unwrap());
        }

        #[test]
        fn test_boolean_rejects_other_words(word in "[a-z]{2,8}") {
            prop_assume!(!["true", "yes", "false", "no"].contains(&word.as_str()));
            prop_assert!(Boolean::default().convert(&word).is_err());
        }

        #[test]
        fn test_integer_round_trip(
            n in any::<i64>(),
            base in prop_oneof![Just(BINARY), Just(OCTAL), Just(DECIMAL), Just(HEXADECIMAL)],
        ) {
            let mut converter = Integer::with_base(0, base).unwrap();
            converter.set_value(n);
            prop_assert_eq!(converter.convert(&converter.serialize()).unwrap(), n);
        }

        #[test]
        fn test_prefixed_round_trip(n in any::<i64>()) {
            let hex = Hex::new(n);
            prop_assert_eq!(hex.convert(&hex.serialize()).unwrap(), n);
            let octal = Octal::new(n);
            prop_assert_eq!(octal.convert(&octal.serialize()).unwrap(), n);
            let binary = Binary::new(n);
            prop_assert_eq!(binary.convert(&binary.serialize()).unwrap(), n);
        }

        #[test]
        fn test_string_list_round_trip(items in proptest::collection::vec("\\PC*", 1..8)) {
            // a lone empty field serializes like the empty list
            prop_assume!(items != [String::new()]);
            let list = List::with_element(items.clone(), Text::default());
            prop_assert_eq!(list.convert(&list.serialize()).unwrap(), items);
        }

        #[test]
        fn test_duration_round_trip(micros in -10_000_000_000_000_i64..10_000_000_000_000_i64) {
            let delta = chrono::TimeDelta::microseconds(micros);
            prop_assert_eq!(parse_duration(&format_iso(&delta)).unwrap(), delta);
        }

        #[test]
        fn test_iso_duration_total_seconds(
            days in 0_u32..1000,
            hours in 0_u32..48,
            minutes in 0_u32..120,
            seconds in 0_u32..120,
        ) {
            let raw = format!("P{days}DT{hours}H{minutes}M{seconds}S");
            let expected = i64::from(days) * 86_400
                + i64::from(hours) * 3_600
                + i64::from(minutes) * 60
                + i64::from(seconds);
            prop_assert_eq!(parse_duration(&raw).unwrap().num_seconds(), expected);
        }

        #[test]
        fn test_url_keeps_scheme_and_host(
            scheme in "(http|https|ftp)",
            host in "[a-z]{1,12}(\\.[a-z]{2,6}){0,2}",
            path in "(/[a-z0-9]{1,8}){0,3}",
        ) {
            let canonical = normalize(&format!("{scheme}://{host}{path}")).unwrap();
            let reparsed = url::Url::parse(&canonical).unwrap();
            prop_assert_eq!(reparsed.scheme(), scheme.as_str());
            prop_assert_eq!(reparsed.host_str(), Some(host.as_str()));
        }

        #[test]
        fn test_url_without_scheme_fails(host in "[a-z]{1,12}\\.[a-z]{2,6}") {
            prop_assert!(normalize(&host).is_err());
            prop_assert!(normalize("").is_err());
        }
    }
}
