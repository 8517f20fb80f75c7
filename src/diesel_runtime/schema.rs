// Tables of the Jenkins raw and tool layers.

diesel::table! {
    #[sql_name = "_raw_jenkins_api_builds"]
    raw_jenkins_api_builds (id) {
        id -> Int8,
        params -> Text,
        data -> Bytea,
        url -> Text,
        input -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    jenkins_builds (connection_id, job_name, number) {
        connection_id -> Int8,
        job_name -> Text,
        number -> Int8,
        duration -> Int8,
        full_display_name -> Text,
        estimated_duration -> Int8,
        result -> Text,
        timestamp -> Int8,
        class -> Text,
        start_time -> Timestamptz,
        commit_sha -> Text,
        triggered_by -> Text,
        raw_data_params -> Text,
        raw_data_table -> Text,
        raw_data_id -> Int8,
        raw_data_remark -> Text,
    }
}

diesel::table! {
    jenkins_build_commits (connection_id, build_name, commit_sha, repo_url) {
        connection_id -> Int8,
        build_name -> Text,
        commit_sha -> Text,
        repo_url -> Text,
        branch -> Text,
        raw_data_params -> Text,
        raw_data_table -> Text,
        raw_data_id -> Int8,
        raw_data_remark -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(jenkins_builds, jenkins_build_commits);
