#[cfg(test)]
mod tests {
    use crate::common::{random_prefix, store, trace};
    use hms_codes::store::{BedStore, CodeStore};
    use hms_codes::{CodeFormat, NewEmergencyBed};

    #[tokio::test]
    async fn max_suffix_skips_malformed_and_overlong_codes() {
        trace();
        let Some(store) = store().await else { return };

        let prefix = random_prefix();
        let other_prefix = random_prefix();

        let suffixes = [
            "03",
            "1x",
            "",
            "+4",
            " 9",
            "-5",
            "0000000000000000001234",
            "9999999999999999999",
            "07",
        ];

        for suffix in suffixes {
            store
                .insert_bed(&format!("{prefix}{suffix}"), &NewEmergencyBed::default())
                .await
                .unwrap();
        }
        store
            .insert_bed(&format!("{other_prefix}99"), &NewEmergencyBed::default())
            .await
            .unwrap();

        let format = CodeFormat::new(&prefix, 2);
        let max = store.max_suffix(&format).await.unwrap();

        assert_eq!(max, Some(7));
        assert_eq!(format.next_code(max).unwrap(), format!("{prefix}08"));
    }

    #[tokio::test]
    async fn max_suffix_accepts_eighteen_digits() {
        trace();
        let Some(store) = store().await else { return };

        let prefix = random_prefix();

        for suffix in ["05", "000000000000000012"] {
            store
                .insert_bed(&format!("{prefix}{suffix}"), &NewEmergencyBed::default())
                .await
                .unwrap();
        }

        let format = CodeFormat::new(&prefix, 2);

        assert_eq!(store.max_suffix(&format).await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn max_suffix_without_codes_is_none() {
        trace();
        let Some(store) = store().await else { return };

        let prefix = random_prefix();
        store
            .insert_bed(&format!("{prefix}abc"), &NewEmergencyBed::default())
            .await
            .unwrap();

        let format = CodeFormat::new(&prefix, 2);
        let max = store.max_suffix(&format).await.unwrap();

        assert_eq!(max, None);
        assert_eq!(format.next_code(max).unwrap(), format!("{prefix}01"));
    }
}
