use std::collections::BTreeMap;

use certqe_common::params::{TEST_LABEL_VALUE, TEST_OPERATOR_LABEL_KEY, TEST_POD_LABEL_KEY};

/// Create labels that can be used as a unique selector for a given app name.
pub fn selector_labels(app: &str) -> BTreeMap<String, String> {
    BTreeMap::from_iter(vec![("app".to_owned(), app.to_owned())])
}

/// Manage by label
pub const MANAGED_BY_LABEL_SELECTOR: &str = "managed-by=certsuite-qe";

/// Labels that indicate the resource was created by the QE suites.
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from_iter(vec![("managed-by".to_owned(), "certsuite-qe".to_owned())])
}

/// Labels certsuite uses to discover pods under test, merged with the app selector.
pub fn test_pod_labels(app: &str) -> BTreeMap<String, String> {
    let mut labels = selector_labels(app);
    labels.insert(TEST_POD_LABEL_KEY.to_owned(), TEST_LABEL_VALUE.to_owned());
    labels
}

/// Labels certsuite uses to discover operators under test.
pub fn test_operator_labels() -> BTreeMap<String, String> {
    BTreeMap::from_iter(vec![(
        TEST_OPERATOR_LABEL_KEY.to_owned(),
        TEST_LABEL_VALUE.to_owned(),
    )])
}
