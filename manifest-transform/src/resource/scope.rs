// Kinds that are not namespaced. Matching is on the kind name alone, which is good enough for the
// small set of builtin kinds a component manifest ships.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "componentstatus",
    "namespace",
    "node",
    "persistentvolume",
    "mutatingwebhookconfiguration",
    "validatingwebhookconfiguration",
    "customresourcedefinition",
    "apiservice",
    "meshpolicy",
    "tokenreview",
    "selfsubjectaccessreview",
    "selfsubjectrulesreview",
    "subjectaccessreview",
    "certificatesigningrequest",
    "clusterrolebinding",
    "clusterrole",
    "priorityclass",
    "storageclass",
    "volumeattachment",
];

pub fn is_cluster_scoped(kind: &str) -> bool {
    CLUSTER_SCOPED_KINDS
        .iter()
        .any(|scoped| scoped.eq_ignore_ascii_case(kind))
}

#[cfg(test)]
#[test]
fn kind_matching_ignores_case() {
    assert!(is_cluster_scoped("ClusterRole"));
    assert!(is_cluster_scoped("CustomResourceDefinition"));
    assert!(is_cluster_scoped("namespace"));
    assert!(!is_cluster_scoped("Deployment"));
    assert!(!is_cluster_scoped("RoleBinding"));
    assert!(!is_cluster_scoped(""));
}
