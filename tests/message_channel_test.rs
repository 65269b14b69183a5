// ==========================================
// 小组消息集成测试
// ==========================================


#[cfg(test)]
mod message_channel_test {
    use group_formation::api::ErrorKind;
    use group_formation::config::config_keys;
    use group_formation::domain::types::MessageType;

    use crate::test_helpers::{setup_env, student, ASSIGNMENT_ID, TEACHER_ID};

    #[test]
    fn test_members_and_teacher_can_post_and_read() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 4}"#, 4);
        let group_id = env
            .state
            .group_api
            .create_group(ASSIGNMENT_ID, &student(1), "讨论组")
            .unwrap()
            .group
            .group_id;
        let messages = &env.state.message_api;

        let m1 = messages.post(&group_id, &student(1), "  周五开会 ").unwrap();
        assert_eq!(m1.content, "周五开会");
        assert_eq!(m1.message_type, MessageType::Text);
        let m2 = messages.post(&group_id, TEACHER_ID, "记得提交报告").unwrap();
        assert!(m2.message_id > m1.message_id);

        // 非成员不可读写
        let err = messages.post(&group_id, &student(2), "我能说话吗").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = messages.list(&group_id, &student(2), 1, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // 创建消息 + 两条文本
        let page = messages.list(&group_id, TEACHER_ID, 1, 10).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.messages[0].message_type, MessageType::System);
        assert_eq!(page.messages[1].content, "周五开会");
        assert_eq!(page.messages[2].sender_id, TEACHER_ID);
    }

    #[test]
    fn test_paging_and_cursor() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 4}"#, 2);
        let group_id = env
            .state
            .group_api
            .create_group(ASSIGNMENT_ID, &student(1), "分页组")
            .unwrap()
            .group
            .group_id;
        let messages = &env.state.message_api;
        for i in 0..5 {
            messages.post(&group_id, &student(1), &format!("消息{}", i)).unwrap();
        }

        let p1 = messages.list(&group_id, &student(1), 1, 4).unwrap();
        let p2 = messages.list(&group_id, &student(1), 2, 4).unwrap();
        assert_eq!(p1.messages.len(), 4);
        assert_eq!(p2.messages.len(), 2);
        assert_eq!(p2.total, 6);
        assert_eq!(p2.messages[1].content, "消息4");

        let cursor = p1.messages[3].message_id;
        let fresh = messages.list_since(&group_id, &student(1), cursor, 10).unwrap();
        assert_eq!(
            fresh.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["消息3", "消息4"]
        );
        assert!(messages
            .list_since(&group_id, &student(1), fresh[1].message_id, 10)
            .unwrap()
            .is_empty());

        // 分页参数校验
        assert_eq!(
            messages.list(&group_id, &student(1), 0, 4).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            messages.list(&group_id, &student(1), 1, 101).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_content_limits_follow_settings() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 4}"#, 2);
        env.state
            .config_manager
            .set_value(config_keys::MESSAGE_MAX_CONTENT_CHARS, "5")
            .unwrap();
        let group_id = env
            .state
            .group_api
            .create_group(ASSIGNMENT_ID, &student(1), "短句组")
            .unwrap()
            .group
            .group_id;
        let messages = &env.state.message_api;

        assert!(messages.post(&group_id, &student(1), "五个字正好").is_ok());
        assert_eq!(
            messages.post(&group_id, &student(1), "六个字超出了").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            messages.post(&group_id, &student(1), "   ").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            messages.post("G404", &student(1), "hi").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
