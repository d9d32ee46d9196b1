//! Hand-built XGBoost JSON models for tests

/// Two trees over the five chat features
///
/// ```text
/// tree 0: hba1c < 6.5 ? -0.4 : (glucose_fasting < 126 ? 0.2 : 0.6)
/// tree 1: age < 45 ? -0.1 : 0.3
/// ```
///
/// `base_score` is spliced in verbatim so both the plain and the bracketed
/// spellings can be exercised.
pub fn two_tree_model(base_score: &str) -> String {
    format!(
        r#"{{
    "learner": {{
        "attributes": {{}},
        "feature_names": ["hba1c", "glucose_postprandial", "glucose_fasting", "family_history_diabetes", "age"],
        "feature_types": ["float", "float", "float", "int", "int"],
        "gradient_booster": {{
            "name": "gbtree",
            "model": {{
                "gbtree_model_param": {{ "num_parallel_tree": "1", "num_trees": "2" }},
                "iteration_indptr": [0, 1, 2],
                "tree_info": [0, 0],
                "trees": [
                    {{
                        "id": 0,
                        "base_weights": [0.0, -0.4, 0.4, 0.2, 0.6],
                        "categories": [],
                        "categories_nodes": [],
                        "categories_segments": [],
                        "categories_sizes": [],
                        "default_left": [1, 0, 0, 0, 0],
                        "left_children": [1, -1, 3, -1, -1],
                        "loss_changes": [10.0, 0.0, 4.0, 0.0, 0.0],
                        "parents": [2147483647, 0, 0, 2, 2],
                        "right_children": [2, -1, 4, -1, -1],
                        "split_conditions": [6.5, -0.4, 126.0, 0.2, 0.6],
                        "split_indices": [0, 0, 2, 0, 0],
                        "split_type": [0, 0, 0, 0, 0],
                        "sum_hessian": [100.0, 40.0, 60.0, 25.0, 35.0],
                        "tree_param": {{ "num_deleted": "0", "num_feature": "5", "num_nodes": "5", "size_leaf_vector": "1" }}
                    }},
                    {{
                        "id": 1,
                        "base_weights": [0.0, -0.1, 0.3],
                        "categories": [],
                        "categories_nodes": [],
                        "categories_segments": [],
                        "categories_sizes": [],
                        "default_left": [0, 0, 0],
                        "left_children": [1, -1, -1],
                        "loss_changes": [3.0, 0.0, 0.0],
                        "parents": [2147483647, 0, 0],
                        "right_children": [2, -1, -1],
                        "split_conditions": [45.0, -0.1, 0.3],
                        "split_indices": [4, 0, 0],
                        "split_type": [0, 0, 0],
                        "sum_hessian": [100.0, 50.0, 50.0],
                        "tree_param": {{ "num_deleted": "0", "num_feature": "5", "num_nodes": "3", "size_leaf_vector": "1" }}
                    }}
                ]
            }}
        }},
        "learner_model_param": {{
            "base_score": "{base_score}",
            "boost_from_average": "1",
            "num_class": "0",
            "num_feature": "5",
            "num_target": "1"
        }},
        "objective": {{
            "name": "binary:logistic",
            "reg_loss_param": {{ "scale_pos_weight": "1" }}
        }}
    }},
    "version": [2, 0, 3]
}}"#
    )
}
